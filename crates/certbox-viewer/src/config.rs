//! Viewer configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use certbox_core::DecryptionKey;
use certbox_render::{RawHtmlPolicy, RenderConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`ViewerConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings for the registry connection, rendering and link generation.
///
/// Missing keys in a configuration file fall back to [`Default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// JSON-RPC endpoint of the chain hosting the registry.
    pub rpc_url: String,
    /// Account of the registry contract.
    pub contract_account_id: String,
    /// Query finality.
    pub finality: String,
    /// Timeout for one registry request.
    pub request_timeout_secs: u64,
    /// Fail on template references to absent fields.
    pub strict_templates: bool,
    /// Permit `{{{raw}}}` template insertions.
    pub allow_raw_html: bool,
    /// Base address of the viewer page, used to build certificate links.
    pub viewer_base_url: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.testnet.near.org".to_string(),
            contract_account_id: "cert.frol4.testnet".to_string(),
            finality: "final".to_string(),
            request_timeout_secs: 10,
            strict_templates: true,
            allow_raw_html: false,
            viewer_base_url: "https://cert.frol4.testnet.page".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Renderer settings derived from this configuration.
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            strict: self.strict_templates,
            raw_html: if self.allow_raw_html {
                RawHtmlPolicy::Allow
            } else {
                RawHtmlPolicy::Deny
            },
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Shareable link: `<base>/<id>#<key hex>`.
    pub fn viewer_url(&self, certificate_id: Option<&str>, key: &DecryptionKey) -> String {
        let base = self.viewer_base_url.trim_end_matches('/');
        match certificate_id {
            Some(id) => format!("{base}/{id}#{}", key.to_hex()),
            None => format!("{base}/#{}", key.to_hex()),
        }
    }
}
