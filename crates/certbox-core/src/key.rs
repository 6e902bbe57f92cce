//! Key and nonce types for the certificate secretbox.

use core::fmt;

use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{DecryptionError, KeyError};

/// Secretbox key length in bytes.
pub const KEY_LEN: usize = 32;

/// Secretbox nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length in bytes; the minimum length of any ciphertext.
pub const TAG_LEN: usize = 16;

/// Symmetric key that opens one sealed certificate.
///
/// The bytes are wiped on drop and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DecryptionKey([u8; KEY_LEN]);

impl DecryptionKey {
    /// Reads the key from a URL fragment such as `#00ff..` or `00ff..`.
    ///
    /// An absent or blank fragment is rejected before any hex decoding, so a
    /// page without a key never reaches the decryptor.
    pub fn from_fragment(fragment: &str) -> Result<Self, KeyError> {
        let trimmed = fragment.trim();
        let hex_str = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
        if hex_str.is_empty() {
            return Err(KeyError::MissingFragment);
        }
        Self::from_hex(hex_str)
    }

    /// Decodes a key from exactly `2 * KEY_LEN` hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let mut bytes = hex::decode(hex_str)?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    /// Copies a key out of a byte slice of the exact key length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }

    /// Generates a fresh random key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Raw key bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Lowercase hex form, as placed in a viewer URL fragment.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; KEY_LEN]> for DecryptionKey {
    fn from(value: [u8; KEY_LEN]) -> Self {
        Self(value)
    }
}

impl fmt::Debug for DecryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecryptionKey(<redacted>)")
    }
}

/// Per-certificate secretbox nonce.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Copies a nonce out of a byte slice of the exact nonce length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecryptionError> {
        let array: [u8; NONCE_LEN] =
            bytes
                .try_into()
                .map_err(|_| DecryptionError::InvalidNonceLength {
                    expected: NONCE_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Generates a fresh random nonce.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Raw nonce bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl From<[u8; NONCE_LEN]> for Nonce {
    fn from(value: [u8; NONCE_LEN]) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn fragment_with_and_without_hash() {
        let with_hash = DecryptionKey::from_fragment(&format!("#{KEY_HEX}")).unwrap();
        let without_hash = DecryptionKey::from_fragment(KEY_HEX).unwrap();
        assert_eq!(with_hash.as_bytes(), without_hash.as_bytes());
        assert_eq!(with_hash.as_bytes()[31], 0x1f);
        assert_eq!(with_hash.to_hex(), KEY_HEX);
    }

    #[test]
    fn uppercase_hex_accepted() {
        let key = DecryptionKey::from_fragment(&KEY_HEX.to_uppercase()).unwrap();
        assert_eq!(key.to_hex(), KEY_HEX);
    }

    #[test]
    fn empty_fragment_is_missing() {
        for fragment in ["", "#", "  ", "# "] {
            assert!(matches!(
                DecryptionKey::from_fragment(fragment),
                Err(KeyError::MissingFragment)
            ));
        }
    }

    #[test]
    fn bad_hex_rejected() {
        assert!(matches!(
            DecryptionKey::from_fragment("#zz"),
            Err(KeyError::InvalidHex(_))
        ));
        assert!(matches!(
            DecryptionKey::from_fragment("#abc"),
            Err(KeyError::InvalidHex(_))
        ));
    }

    #[test]
    fn wrong_length_rejected() {
        match DecryptionKey::from_fragment("#00ff") {
            Err(KeyError::InvalidLength { expected, actual }) => {
                assert_eq!(expected, KEY_LEN);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = DecryptionKey::from([0xab; KEY_LEN]);
        let debug = format!("{key:?}");
        assert!(!debug.contains("ab"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn nonce_length_enforced() {
        assert!(Nonce::from_slice(&[0u8; NONCE_LEN]).is_ok());
        assert!(matches!(
            Nonce::from_slice(&[0u8; 12]),
            Err(DecryptionError::InvalidNonceLength {
                expected: NONCE_LEN,
                actual: 12
            })
        ));
    }
}
