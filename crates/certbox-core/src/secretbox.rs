//! XSalsa20-Poly1305 secretbox sealing and opening.

use crypto_secretbox::aead::generic_array::GenericArray;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::XSalsa20Poly1305;
use zeroize::Zeroizing;

use crate::data::CertificateData;
use crate::error::{DecryptionError, SealError};
use crate::key::{DecryptionKey, Nonce, TAG_LEN};

fn cipher(key: &DecryptionKey) -> XSalsa20Poly1305 {
    XSalsa20Poly1305::new(GenericArray::from_slice(key.as_bytes()))
}

/// Seals `plaintext` under `nonce` and `key` (tag prepended, NaCl layout).
pub fn seal(plaintext: &[u8], nonce: &Nonce, key: &DecryptionKey) -> Result<Vec<u8>, SealError> {
    cipher(key)
        .encrypt(GenericArray::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|_| SealError::Encryption)
}

/// Opens a secretbox, returning the plaintext only if the MAC verifies.
pub fn open(
    encrypted_data: &[u8],
    nonce: &[u8],
    key: &DecryptionKey,
) -> Result<Vec<u8>, DecryptionError> {
    let nonce = Nonce::from_slice(nonce)?;
    if encrypted_data.len() < TAG_LEN {
        return Err(DecryptionError::Truncated {
            expected: TAG_LEN,
            actual: encrypted_data.len(),
        });
    }
    cipher(key)
        .decrypt(GenericArray::from_slice(nonce.as_bytes()), encrypted_data)
        .map_err(|_| {
            tracing::warn!(
                ciphertext_len = encrypted_data.len(),
                "certificate failed authentication"
            );
            DecryptionError::Authentication
        })
}

/// Opens a sealed certificate and parses its payload.
///
/// Nothing is parsed unless the MAC verifies; the released plaintext is wiped
/// once the record has been built.
pub fn decrypt(
    encrypted_data: &[u8],
    nonce: &[u8],
    key: &DecryptionKey,
) -> Result<CertificateData, DecryptionError> {
    let plaintext = Zeroizing::new(open(encrypted_data, nonce, key)?);
    tracing::debug!(plaintext_len = plaintext.len(), "certificate opened");
    CertificateData::from_plaintext(&plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KEY_LEN, NONCE_LEN};
    use rand::{Rng, RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const HELLO: &[u8] = br#"{"certificate_template":"Hello {{name}}","name":"Ana"}"#;

    fn zero_key() -> DecryptionKey {
        DecryptionKey::from([0u8; KEY_LEN])
    }

    fn fixed_nonce() -> Nonce {
        Nonce::from([7u8; NONCE_LEN])
    }

    #[test]
    fn zero_key_scenario_recovers_exact_json() {
        let sealed = seal(HELLO, &fixed_nonce(), &zero_key()).unwrap();
        assert_eq!(sealed.len(), HELLO.len() + TAG_LEN);

        let opened = open(&sealed, fixed_nonce().as_bytes(), &zero_key()).unwrap();
        assert_eq!(opened, HELLO);

        let data = decrypt(&sealed, fixed_nonce().as_bytes(), &zero_key()).unwrap();
        assert_eq!(data.get("name").and_then(|v| v.as_str()), Some("Ana"));
    }

    #[test]
    fn different_key_fails() {
        let sealed = seal(HELLO, &fixed_nonce(), &zero_key()).unwrap();
        let other = DecryptionKey::from([1u8; KEY_LEN]);
        let err = decrypt(&sealed, fixed_nonce().as_bytes(), &other).unwrap_err();
        assert!(matches!(err, DecryptionError::Authentication));
    }

    #[test]
    fn seal_open_round_trip_random() {
        let mut rng = ChaCha20Rng::from_seed([9u8; 32]);
        for _ in 0..100 {
            let key = DecryptionKey::generate(&mut rng);
            let nonce = Nonce::generate(&mut rng);
            let len = rng.gen_range(0..512);
            let mut plaintext = vec![0u8; len];
            rng.fill_bytes(&mut plaintext);

            let sealed = seal(&plaintext, &nonce, &key).unwrap();
            let opened = open(&sealed, nonce.as_bytes(), &key).unwrap();
            assert_eq!(opened, plaintext);
        }
    }

    #[test]
    fn any_single_key_bit_flip_fails() {
        let mut rng = ChaCha20Rng::from_seed([3u8; 32]);
        let key = DecryptionKey::generate(&mut rng);
        let nonce = Nonce::generate(&mut rng);
        let sealed = seal(HELLO, &nonce, &key).unwrap();

        for bit in 0..KEY_LEN * 8 {
            let mut bytes = *key.as_bytes();
            bytes[bit / 8] ^= 1 << (bit % 8);
            let altered = DecryptionKey::from(bytes);
            let result = decrypt(&sealed, nonce.as_bytes(), &altered);
            assert!(
                matches!(result, Err(DecryptionError::Authentication)),
                "bit {bit} flip was accepted"
            );
        }
    }

    #[test]
    fn bit_flipped_ciphertext_fails() {
        let mut rng = ChaCha20Rng::from_seed([4u8; 32]);
        let key = DecryptionKey::generate(&mut rng);
        let nonce = Nonce::generate(&mut rng);
        let sealed = seal(HELLO, &nonce, &key).unwrap();

        for _ in 0..64 {
            let mut tampered = sealed.clone();
            let idx = rng.gen_range(0..tampered.len());
            tampered[idx] ^= 1u8 << rng.gen_range(0..8u32);
            assert!(matches!(
                open(&tampered, nonce.as_bytes(), &key),
                Err(DecryptionError::Authentication)
            ));
        }
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let sealed = seal(HELLO, &fixed_nonce(), &zero_key()).unwrap();
        for len in [sealed.len() - 1, TAG_LEN + 1, TAG_LEN] {
            assert!(matches!(
                open(&sealed[..len], fixed_nonce().as_bytes(), &zero_key()),
                Err(DecryptionError::Authentication)
            ));
        }
        for len in [TAG_LEN - 1, 1, 0] {
            assert!(matches!(
                open(&sealed[..len], fixed_nonce().as_bytes(), &zero_key()),
                Err(DecryptionError::Truncated { .. })
            ));
        }
    }

    #[test]
    fn wrong_nonce_fails() {
        let sealed = seal(HELLO, &fixed_nonce(), &zero_key()).unwrap();
        let other = Nonce::from([8u8; NONCE_LEN]);
        assert!(matches!(
            open(&sealed, other.as_bytes(), &zero_key()),
            Err(DecryptionError::Authentication)
        ));
        assert!(matches!(
            open(&sealed, &[7u8; 12], &zero_key()),
            Err(DecryptionError::InvalidNonceLength { .. })
        ));
    }

    #[test]
    fn authenticated_garbage_is_malformed_plaintext() {
        let sealed = seal(b"not json", &fixed_nonce(), &zero_key()).unwrap();
        assert!(matches!(
            decrypt(&sealed, fixed_nonce().as_bytes(), &zero_key()),
            Err(DecryptionError::Json(_))
        ));
    }
}
