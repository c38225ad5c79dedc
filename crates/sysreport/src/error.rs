use miette::Diagnostic;
use thiserror::Error;

/// HTTP-level status reported for failures that never produced a usable response
pub const SENTINEL_STATUS: u16 = 500;

/// Request and response bodies embedded in errors are cut to this many bytes
const MAX_DIAGNOSTIC_BODY: usize = 1024;

/// Errors raised while building or delivering system reports
#[derive(Error, Debug, Diagnostic)]
pub enum ReportError {
    /// The request could not be constructed or sent (connection, DNS, TLS)
    #[error("Request to '{url}' failed: {message}")]
    #[diagnostic(code(kscloud_sysreport::transport))]
    Transport {
        /// Target URL
        url: String,
        /// Underlying client error
        message: String,
    },

    /// The backend answered outside the 2xx range
    #[error("Request to '{url}' returned HTTP {status}: {body}")]
    #[diagnostic(code(kscloud_sysreport::status))]
    Status {
        /// Target URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body, best effort
        body: String,
    },

    /// Every attempt in the retry budget failed
    #[error(
        "attempt #{attempt} {identity} - Failed posting report. Url: '{url}', reason: '{source}' report: '{request}' response: '{response}'"
    )]
    #[diagnostic(
        code(kscloud_sysreport::retry_exhausted),
        help("The backend stayed unreachable for the whole retry budget; later sends are independent attempts")
    )]
    RetryExhausted {
        /// Zero-based index of the last attempt
        attempt: usize,
        /// Report identity for log correlation
        identity: String,
        /// Target URL
        url: String,
        /// Truncated request body
        request: String,
        /// Truncated response body of the last attempt
        response: String,
        /// Error of the last attempt
        #[source]
        source: Box<ReportError>,
    },

    /// The report could not be serialized; never retried
    #[error("Couldn't marshal report object: {0}")]
    #[diagnostic(code(kscloud_sysreport::serialization))]
    Serialization(#[from] serde_json::Error),

    /// The configured endpoint could not be resolved
    #[error(transparent)]
    #[diagnostic(transparent)]
    Endpoint(#[from] kscloud_core::CoreError),

    /// The retry loop ended without any response
    #[error("Failed to send report, empty response from '{url}'")]
    #[diagnostic(code(kscloud_sysreport::empty_response))]
    EmptyResponse {
        /// Target URL
        url: String,
    },

    /// A background send panicked and was recovered
    #[error("Report send panicked: {message}")]
    #[diagnostic(code(kscloud_sysreport::panicked))]
    Panicked {
        /// Panic payload, when it was a string
        message: String,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {message}")]
    #[diagnostic(code(kscloud_sysreport::client))]
    Client {
        /// Builder error
        message: String,
    },
}

impl ReportError {
    /// Create a transport error
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a non-2xx status error
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a retry exhausted error wrapping the last attempt's failure
    #[must_use]
    pub fn retry_exhausted(
        attempt: usize,
        identity: impl Into<String>,
        url: impl Into<String>,
        request: &str,
        response: &str,
        last: Self,
    ) -> Self {
        Self::RetryExhausted {
            attempt,
            identity: identity.into(),
            url: url.into(),
            request: truncate_for_diagnostics(request),
            response: truncate_for_diagnostics(response),
            source: Box::new(last),
        }
    }

    /// HTTP status associated with this failure.
    ///
    /// A protocol error reports the status the backend answered with; every
    /// other failure reports [`SENTINEL_STATUS`].
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            _ => SENTINEL_STATUS,
        }
    }

    /// Whether another attempt may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::EmptyResponse { .. }
        )
    }
}

/// Cut a body to [`MAX_DIAGNOSTIC_BODY`] bytes on a char boundary
pub(crate) fn truncate_for_diagnostics(text: &str) -> String {
    if text.len() <= MAX_DIAGNOSTIC_BODY {
        return text.to_string();
    }
    let mut end = MAX_DIAGNOSTIC_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes truncated)", &text[..end], text.len() - end)
}

/// Result type for system report operations
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_sentinel() {
        assert_eq!(ReportError::transport("u", "refused").status_code(), 500);
        assert_eq!(ReportError::status("u", 404, "nope").status_code(), 404);
        let exhausted =
            ReportError::retry_exhausted(1, "id", "u", "{}", "", ReportError::status("u", 503, ""));
        assert_eq!(exhausted.status_code(), SENTINEL_STATUS);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ReportError::transport("u", "dns").is_retryable());
        assert!(ReportError::status("u", 502, "").is_retryable());
        assert!(!ReportError::Panicked { message: "boom".into() }.is_retryable());
        let serde_err = serde_json::from_str::<u8>("x").unwrap_err();
        assert!(!ReportError::from(serde_err).is_retryable());
    }

    #[test]
    fn test_retry_exhausted_message_has_context() {
        let err = ReportError::retry_exhausted(
            2,
            "cluster::job::3",
            "https://er/k8s/sysreport",
            r#"{"status":"failure"}"#,
            "bad gateway",
            ReportError::status("https://er/k8s/sysreport", 502, "bad gateway"),
        );
        let msg = err.to_string();
        assert!(msg.contains("attempt #2"));
        assert!(msg.contains("cluster::job::3"));
        assert!(msg.contains("https://er/k8s/sysreport"));
        assert!(msg.contains("HTTP 502"));
        assert!(msg.contains(r#"{"status":"failure"}"#));
    }

    #[test]
    fn test_truncate_for_diagnostics() {
        let short = "a".repeat(10);
        assert_eq!(truncate_for_diagnostics(&short), short);

        let long = "é".repeat(1000);
        let cut = truncate_for_diagnostics(&long);
        assert!(cut.len() < long.len());
        assert!(cut.contains("bytes truncated"));
    }
}
