//! Sealed certificate primitives shared across the certbox workspace.
//!
//! A certificate travels as an XSalsa20-Poly1305 secretbox (the NaCl
//! construction, tag prepended) together with its 24-byte nonce. The 32-byte
//! key never travels with it; viewers receive it in the address fragment.
//!
//! This crate provides:
//! - Key and nonce types, including key acquisition from a URL fragment.
//! - Authenticated [`open`]/[`seal`] and the [`decrypt`] step that yields a
//!   [`CertificateData`] record.
//! - The JSON wire shape of a stored certificate ([`CertificateRecord`]).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod data;
mod error;
mod key;
mod record;
mod secretbox;

pub use crate::data::{CertificateData, CertificateDraft, TEMPLATE_FIELD};
pub use crate::error::{DecryptionError, KeyError, SealError};
pub use crate::key::{DecryptionKey, Nonce, KEY_LEN, NONCE_LEN, TAG_LEN};
pub use crate::record::{CertificateRecord, CertificateStatus};
pub use crate::secretbox::{decrypt, open, seal};
