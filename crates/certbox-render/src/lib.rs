//! Certificate template rendering.
//!
//! A decrypted certificate carries its own Handlebars template in the
//! `certificate_template` field. [`Renderer`] compiles that template and
//! evaluates it against the whole record, producing HTML markup.
//!
//! Values are HTML-escaped. Raw insertion (`{{{field}}}`) is refused unless
//! the renderer is configured with [`RawHtmlPolicy::Allow`]. Strict mode is on
//! by default, so a template naming an absent field fails instead of
//! rendering an empty string.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod markup;
mod renderer;

pub use config::{RawHtmlPolicy, RenderConfig};
pub use error::TemplateError;
pub use markup::{escape_html, RenderedMarkup};
pub use renderer::Renderer;
