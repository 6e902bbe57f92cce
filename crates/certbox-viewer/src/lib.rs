//! Certificate viewer pipeline.
//!
//! The viewer reads a key from the page address fragment, opens the sealed
//! certificate (embedded in the page or fetched from the registry), renders
//! it through its own template and mounts the markup. Every stage fails fast;
//! a failed run mounts an explicit error page instead of partial output.
//!
//! Page access goes through [`PageContext`] and [`MountTarget`] so the
//! pipeline itself never touches environment globals.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod fetch;
mod page;
mod pipeline;

pub use config::{ConfigError, ViewerConfig};
pub use error::{FailureKind, ViewerError};
pub use fetch::{
    parse_query_response, query_request, CertificateFetcher, FetchError, RpcFetcher,
};
pub use page::{
    error_page, mount_outcome, page_shell, MountBuffer, MountTarget, PageContext, StaticPage,
};
pub use pipeline::{Pipeline, PipelineState, RenderedCertificate};
