//! Error types for parentcfg

use thiserror::Error;

/// Errors that abort a whole compilation.
///
/// Problems scoped to a single delivery service never surface here; they
/// drop that service from the output and are reported as skips instead.
#[derive(Error, Debug)]
pub enum ParentConfigError {
    /// No generating server descriptor was supplied
    #[error("missing generating server descriptor")]
    MissingServer,

    /// Generating server descriptor is unusable
    #[error("invalid generating server: {0}")]
    InvalidServer(String),

    /// Snapshot could not be loaded
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Result type for parentcfg
pub type Result<T> = std::result::Result<T, ParentConfigError>;
