//! Rendered output.

use core::fmt;

/// HTML produced by rendering a certificate. Recomputed on every render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedMarkup(String);

impl RenderedMarkup {
    /// Wraps markup that is already safe to inject.
    pub fn from_trusted(markup: String) -> Self {
        Self(markup)
    }

    /// Markup as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RenderedMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escapes text for placement in HTML content or a quoted attribute.
pub fn escape_html(text: &str) -> String {
    handlebars::html_escape(text)
}
