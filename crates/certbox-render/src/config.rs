//! Renderer configuration.

use serde::{Deserialize, Serialize};

/// Whether templates may insert field values without HTML escaping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawHtmlPolicy {
    /// Templates containing `{{{…}}}` or `{{&…}}` are rejected.
    #[default]
    Deny,
    /// Raw insertion is permitted. Only for payloads whose every field is
    /// trusted as markup.
    Allow,
}

/// Configuration for [`crate::Renderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Fail on references to absent fields.
    pub strict: bool,
    /// Raw insertion policy.
    pub raw_html: RawHtmlPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            strict: true,
            raw_html: RawHtmlPolicy::Deny,
        }
    }
}
