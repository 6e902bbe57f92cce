//! Decrypted certificate payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecryptionError;

/// Field that carries the template inside every certificate payload.
pub const TEMPLATE_FIELD: &str = "certificate_template";

/// Decrypted certificate record.
///
/// The payload is an arbitrary JSON object. Renderers read the template from
/// [`TEMPLATE_FIELD`] and evaluate it against the whole object, so any field
/// may be referenced by the template.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateData(Map<String, Value>);

impl CertificateData {
    /// Parses released secretbox plaintext.
    pub fn from_plaintext(plaintext: &[u8]) -> Result<Self, DecryptionError> {
        let text = std::str::from_utf8(plaintext)?;
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(DecryptionError::NotAnObject(json_kind(&other))),
        }
    }

    /// Wraps an already parsed JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Serializes the record as compact UTF-8 JSON, the sealed plaintext form.
    pub fn to_plaintext(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }

    /// Raw template field, if present.
    pub fn template(&self) -> Option<&Value> {
        self.0.get(TEMPLATE_FIELD)
    }

    /// Template kind hint such as `svg-template`.
    pub fn template_kind(&self) -> Option<&str> {
        self.0
            .get("certificate_template_kind")
            .and_then(Value::as_str)
    }

    /// Display name of the person or team the certificate was issued for.
    pub fn issued_for(&self) -> Option<&str> {
        self.0.get("issued_for_display_name").and_then(Value::as_str)
    }

    /// Looks up a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Sets a top-level field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// All fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Issuer-side certificate contents before sealing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateDraft {
    /// Team name or a person's full name.
    pub issued_for_display_name: String,
    /// Kind of template, e.g. `svg-template`.
    pub certificate_template_kind: String,
    /// Template source rendered by viewers.
    pub certificate_template: String,
    /// Key-value pairs passed to the template.
    #[serde(default)]
    pub certificate_fields: BTreeMap<String, String>,
}

impl CertificateDraft {
    /// Converts the draft into the payload record that gets sealed.
    pub fn into_data(self) -> Result<CertificateData, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(CertificateData(fields)),
            other => Err(serde::ser::Error::custom(format!(
                "certificate draft serialized to {}, expected an object",
                json_kind(&other)
            ))),
        }
    }
}
