use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while resolving backend endpoints
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The configured host could not be turned into a scheme/host pair
    #[error("Invalid endpoint '{url}': {reason}")]
    #[diagnostic(
        code(kscloud_core::invalid_endpoint),
        help("Use a bare host name or a URL starting with http://, https://, ws:// or wss://")
    )]
    InvalidEndpoint {
        /// The raw value that was configured
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

impl CoreError {
    /// Create an invalid endpoint error
    #[must_use]
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for kscloud-core operations
pub type Result<T> = std::result::Result<T, CoreError>;
