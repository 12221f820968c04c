//! Error taxonomy
//!
//! Every failure crossing a layer boundary is one of these kinds, each with
//! a JSON-RPC error code in the custom range (-32000 to -32099). Messages
//! are short and never contain token material, file-system paths from the
//! token store, or backtraces.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Client-caused: a tool parameter is missing, mistyped, or out of bounds.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// No usable credential; the caller must complete interactive consent.
    #[error("authentication required: {0}")]
    Auth(String),

    /// The identity provider rejected the refresh token; re-consent needed.
    #[error("authorization expired: {0}")]
    AuthExpired(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Remote throttling, surfaced only after the retry budget is exhausted.
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Native document content was malformed or not convertible.
    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// JSON-RPC error code for this kind.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidParameters(_) => -32602,
            Error::Internal(_) => -32000,
            Error::PermissionDenied(_) => -32001,
            Error::NotFound(_) => -32004,
            Error::RateLimited(_) => -32005,
            Error::Timeout(_) => -32006,
            Error::UnsupportedFormat(_) => -32007,
            Error::Conversion(_) => -32008,
            Error::Auth(_) => -32010,
            Error::AuthExpired(_) => -32011,
        }
    }

    /// Whether the condition is transient and worth retrying internally.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
