//! Pipeline failures.

use certbox_core::{DecryptionError, KeyError};
use certbox_render::TemplateError;
use thiserror::Error;

use crate::fetch::FetchError;

/// Reason a viewer run ended without markup.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// No usable key in the address fragment.
    #[error("key acquisition failed: {0}")]
    KeyAcquisition(#[from] KeyError),

    /// The certificate did not authenticate or did not parse.
    #[error("decryption failed: {0}")]
    Decryption(#[from] DecryptionError),

    /// The certificate template could not be rendered.
    #[error("rendering failed: {0}")]
    Template(#[from] TemplateError),

    /// The registry query failed.
    #[error("certificate fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The page embeds no certificate.
    #[error("page does not embed a certificate")]
    MissingCertificate,

    /// The page names no certificate to fetch.
    #[error("page does not name a certificate id")]
    MissingCertificateId,

    /// The certificate id is not a registry id (an unsigned 64-bit integer).
    #[error("invalid certificate id {0:?}")]
    InvalidCertificateId(String),

    /// The registry has no certificate with this id.
    #[error("certificate {0} not found")]
    NotFound(String),

    /// The fetch was abandoned before it completed.
    #[error("certificate fetch was cancelled")]
    Cancelled,

    /// The pipeline left `Idle` already; reset it to retry.
    #[error("pipeline already ran; reset it before retrying")]
    AlreadyRan,
}

/// Coarse failure class recorded in [`crate::PipelineState::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// See [`ViewerError::KeyAcquisition`].
    KeyAcquisition,
    /// See [`ViewerError::Decryption`].
    Decryption,
    /// See [`ViewerError::Template`].
    Template,
    /// See [`ViewerError::Fetch`].
    Fetch,
    /// See [`ViewerError::MissingCertificate`] and [`ViewerError::MissingCertificateId`].
    MissingCertificate,
    /// See [`ViewerError::InvalidCertificateId`].
    InvalidCertificateId,
    /// See [`ViewerError::NotFound`].
    NotFound,
    /// See [`ViewerError::Cancelled`].
    Cancelled,
    /// See [`ViewerError::AlreadyRan`].
    AlreadyRan,
}

impl ViewerError {
    /// Failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::KeyAcquisition(_) => FailureKind::KeyAcquisition,
            Self::Decryption(_) => FailureKind::Decryption,
            Self::Template(_) => FailureKind::Template,
            Self::Fetch(_) => FailureKind::Fetch,
            Self::MissingCertificate | Self::MissingCertificateId => {
                FailureKind::MissingCertificate
            }
            Self::InvalidCertificateId(_) => FailureKind::InvalidCertificateId,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Cancelled => FailureKind::Cancelled,
            Self::AlreadyRan => FailureKind::AlreadyRan,
        }
    }
}
