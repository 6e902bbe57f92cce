//! Stored certificate records.

use serde::{Deserialize, Serialize};

use crate::data::CertificateData;
use crate::error::{DecryptionError, SealError};
use crate::key::{DecryptionKey, Nonce};
use crate::secretbox;

/// Issuer-assigned certificate status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificateStatus {
    /// Valid certificate.
    New,
    /// Certificate withdrawn by its issuer or the registry owner.
    Revoked {
        /// Human readable revocation reason.
        reason: String,
    },
}

/// Sealed certificate as stored by the registry or embedded in a page.
///
/// Byte fields serialize as JSON arrays of numbers. Hex strings are also
/// accepted when reading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Secretbox ciphertext of the JSON payload.
    #[serde(with = "bytes_field")]
    pub encrypted_certificate_data: Vec<u8>,
    /// Nonce the payload was sealed with.
    #[serde(with = "bytes_field")]
    pub certificate_encryption_nonce: Vec<u8>,
    /// Account that issued the certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_account_id: Option<String>,
    /// Issuer-assigned status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CertificateStatus>,
    /// Registry template identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_template_id: Option<String>,
    /// Issuer-encrypted key recovery material; opaque to viewers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_encryption_recovery: Option<Vec<u8>>,
}

impl CertificateRecord {
    /// Seals `data` into a fresh record with status `NEW`.
    pub fn seal(
        data: &CertificateData,
        nonce: &Nonce,
        key: &DecryptionKey,
    ) -> Result<Self, SealError> {
        let plaintext = zeroize::Zeroizing::new(data.to_plaintext()?);
        let encrypted_certificate_data = secretbox::seal(&plaintext, nonce, key)?;
        Ok(Self {
            encrypted_certificate_data,
            certificate_encryption_nonce: nonce.as_bytes().to_vec(),
            issuer_account_id: None,
            status: Some(CertificateStatus::New),
            certificate_template_id: None,
            certificate_encryption_recovery: None,
        })
    }

    /// Opens the record with `key`.
    pub fn decrypt(&self, key: &DecryptionKey) -> Result<CertificateData, DecryptionError> {
        secretbox::decrypt(
            &self.encrypted_certificate_data,
            &self.certificate_encryption_nonce,
            key,
        )
    }

    /// Revocation reason, if the record has been revoked.
    pub fn revocation_reason(&self) -> Option<&str> {
        match &self.status {
            Some(CertificateStatus::Revoked { reason }) => Some(reason),
            _ => None,
        }
    }
}

mod bytes_field {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Array(Vec<u8>),
        Hex(String),
    }

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        bytes.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Array(bytes) => Ok(bytes),
            Repr::Hex(text) => hex::decode(text.trim()).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KEY_LEN, NONCE_LEN};

    #[test]
    fn parses_registry_json() {
        let json = r#"{
            "issuer_account_id": "issuer.testnet",
            "status": {"kind": "REVOKED", "reason": "expired"},
            "certificate_template_id": "0",
            "encrypted_certificate_data": [1, 2, 3],
            "certificate_encryption_nonce": [4, 5],
            "certificate_encryption_recovery": null
        }"#;
        let record: CertificateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.encrypted_certificate_data, vec![1, 2, 3]);
        assert_eq!(record.certificate_encryption_nonce, vec![4, 5]);
        assert_eq!(record.revocation_reason(), Some("expired"));
        assert_eq!(record.certificate_encryption_recovery, None);
    }

    #[test]
    fn accepts_hex_byte_fields() {
        let json = r#"{"encrypted_certificate_data":"0a0B","certificate_encryption_nonce":"ff"}"#;
        let record: CertificateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.encrypted_certificate_data, vec![0x0a, 0x0b]);
        assert_eq!(record.certificate_encryption_nonce, vec![0xff]);
        assert_eq!(record.status, None);
    }

    #[test]
    fn rejects_invalid_hex_byte_fields() {
        let json = r#"{"encrypted_certificate_data":"xyz","certificate_encryption_nonce":[]}"#;
        assert!(serde_json::from_str::<CertificateRecord>(json).is_err());
    }

    #[test]
    fn serializes_bytes_as_arrays() {
        let record = CertificateRecord {
            encrypted_certificate_data: vec![1, 255],
            certificate_encryption_nonce: vec![0],
            issuer_account_id: None,
            status: Some(CertificateStatus::New),
            certificate_template_id: None,
            certificate_encryption_recovery: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["encrypted_certificate_data"], serde_json::json!([1, 255]));
        assert_eq!(value["status"], serde_json::json!({"kind": "NEW"}));
        assert!(value.get("issuer_account_id").is_none());
    }

    #[test]
    fn sealed_record_decrypts() {
        let data = CertificateData::from_plaintext(br#"{"certificate_template":"x"}"#).unwrap();
        let key = DecryptionKey::from([5u8; KEY_LEN]);
        let record = CertificateRecord::seal(&data, &Nonce::from([6u8; NONCE_LEN]), &key).unwrap();
        assert_eq!(record.certificate_encryption_nonce.len(), NONCE_LEN);
        assert_eq!(record.decrypt(&key).unwrap(), data);
        assert!(record
            .decrypt(&DecryptionKey::from([0u8; KEY_LEN]))
            .is_err());
    }
}
