//! Template failures.

use thiserror::Error;

/// Failure to turn a certificate record into markup.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The record has no `certificate_template` field.
    #[error("certificate has no certificate_template field")]
    MissingTemplate,

    /// The `certificate_template` field is not a string.
    #[error("certificate_template must be a string")]
    TemplateNotString,

    /// The template uses raw insertion while the policy denies it.
    #[error("template inserts unescaped HTML at byte {offset}; raw insertion is disabled")]
    RawHtmlDenied {
        /// Byte offset of the offending tag.
        offset: usize,
    },

    /// The template does not compile.
    #[error("template failed to compile: {0}")]
    Compile(#[from] Box<handlebars::TemplateError>),

    /// Evaluation failed, e.g. an absent field in strict mode.
    #[error("template failed to render: {0}")]
    Render(#[from] Box<handlebars::RenderError>),
}

impl From<handlebars::TemplateError> for TemplateError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Compile(Box::new(err))
    }
}

impl From<handlebars::RenderError> for TemplateError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Render(Box::new(err))
    }
}
