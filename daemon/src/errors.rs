//! Error types for the slipway daemon

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the slipway daemon
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No registry backing store configured at all. Distinct from
    /// [`Error::Registry`]: this one means the settings never named a store.
    #[error("configuration error: {0}")]
    Config(String),

    /// Registry store declared in the settings but missing or unreadable.
    #[error("registry error: {0}")]
    Registry(String),

    /// Registry document rejected at save time (duplicate names or
    /// duplicate (repository, branch) pairs).
    #[error("validation error: {0}")]
    Validation(String),

    /// Existing working copy points at a different remote, or the directory
    /// is not a working copy at all. Requires operator action.
    #[error("deployment conflict: {0}")]
    Conflict(String),

    #[error("git error: {0}")]
    Git(String),

    #[error("image build error: {0}")]
    Build(String),

    #[error("container error: {0}")]
    Container(String),

    #[error("proxy error: {0}")]
    Proxy(String),

    #[error("invalid signature: {0}")]
    Signature(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("shutdown error: {0}")]
    Shutdown(String),
}
