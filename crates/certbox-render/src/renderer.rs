//! Template compilation and evaluation.

use certbox_core::CertificateData;
use handlebars::Handlebars;
use serde_json::Value;

use crate::config::{RawHtmlPolicy, RenderConfig};
use crate::error::TemplateError;
use crate::markup::RenderedMarkup;

const TEMPLATE_NAME: &str = "certificate";

/// Renders decrypted certificates through their embedded template.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    /// Creates a renderer with the default (strict, escaped) configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer with explicit configuration.
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Returns a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    /// Compiles the record's template and evaluates it against the record.
    ///
    /// Either the complete markup is returned or nothing is.
    pub fn render(&self, data: &CertificateData) -> Result<RenderedMarkup, TemplateError> {
        let source = match data.template() {
            None => return Err(TemplateError::MissingTemplate),
            Some(Value::String(source)) => source.as_str(),
            Some(_) => return Err(TemplateError::TemplateNotString),
        };

        if self.config.raw_html == RawHtmlPolicy::Deny {
            if let Some(offset) = find_raw_insertion(source) {
                return Err(TemplateError::RawHtmlDenied { offset });
            }
        }

        let registry = self.compile(source)?;
        let markup = registry.render(TEMPLATE_NAME, data)?;
        tracing::debug!(
            template_kind = data.template_kind().unwrap_or("unspecified"),
            markup_len = markup.len(),
            "certificate rendered"
        );
        Ok(RenderedMarkup::from_trusted(markup))
    }

    fn compile(&self, source: &str) -> Result<Handlebars<'static>, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(self.config.strict);
        registry.register_template_string(TEMPLATE_NAME, source)?;
        Ok(registry)
    }
}

/// Byte offset of the first `{{{` or `{{&` tag.
///
/// Whitespace and `~` between the braces and the marker are skipped, since the
/// template parser accepts them there.
fn find_raw_insertion(source: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut start = 0;
    while let Some(pos) = source[start..].find("{{") {
        let open = start + pos;
        let mut next = open + 2;
        while matches!(bytes.get(next), Some(b) if *b == b'~' || b.is_ascii_whitespace()) {
            next += 1;
        }
        if matches!(bytes.get(next), Some(b'{') | Some(b'&')) {
            return Some(open);
        }
        start = open + 2;
    }
    None
}
