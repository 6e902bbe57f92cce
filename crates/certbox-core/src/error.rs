//! Error types for key acquisition, sealing and opening.

use thiserror::Error;

/// Failure to obtain a usable key from the page address.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The fragment is absent or empty.
    #[error("certificate key is missing from the address fragment")]
    MissingFragment,

    /// The fragment is not valid hex.
    #[error("certificate key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The decoded key has the wrong length.
    #[error("certificate key must be {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required key length.
        expected: usize,
        /// Decoded key length.
        actual: usize,
    },
}

/// Failure to turn a sealed certificate back into a record.
#[derive(Debug, Error)]
pub enum DecryptionError {
    /// The nonce does not have the secretbox nonce length.
    #[error("nonce must be {expected} bytes, got {actual}")]
    InvalidNonceLength {
        /// Required nonce length.
        expected: usize,
        /// Supplied nonce length.
        actual: usize,
    },

    /// The ciphertext cannot even hold an authentication tag.
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum ciphertext length.
        expected: usize,
        /// Supplied ciphertext length.
        actual: usize,
    },

    /// MAC verification failed: wrong key or tampered ciphertext.
    #[error("ciphertext failed authentication")]
    Authentication,

    /// The released plaintext is not UTF-8.
    #[error("plaintext is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The released plaintext is not JSON.
    #[error("plaintext is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The released plaintext is JSON but not an object.
    #[error("plaintext must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Failure to seal a certificate.
#[derive(Debug, Error)]
pub enum SealError {
    /// The cipher refused the plaintext.
    #[error("encryption failed")]
    Encryption,

    /// The certificate record could not be serialized.
    #[error("certificate serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
