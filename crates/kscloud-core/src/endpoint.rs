//! Endpoint resolution for backend URLs
//!
//! Configuration usually carries a bare host (`api.example.com`) or a URL
//! with one of the supported scheme prefixes. [`parse_host`] splits it into
//! a [`Scheme`] and the remaining host part, defaulting to HTTPS.

use crate::error::{CoreError, Result};
use std::fmt;

/// URL schemes understood by the backend clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain HTTP
    Http,
    /// HTTP over TLS (default)
    Https,
    /// Plain websocket
    Ws,
    /// Websocket over TLS
    Wss,
}

impl Scheme {
    /// Prefixes checked in order; `https://` is handled by the default branch
    const PREFIXES: [(&'static str, Self); 3] = [
        ("ws://", Self::Ws),
        ("wss://", Self::Wss),
        ("http://", Self::Http),
    ];

    /// Scheme name without the `://` separator
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved scheme/host pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Scheme detected from the configured value
    pub scheme: Scheme,
    /// Host (optionally with port) without scheme or trailing slash
    pub host: String,
}

impl Endpoint {
    /// Resolve a configured host or URL.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidEndpoint`] if the value is empty after
    /// stripping the scheme, contains whitespace, or carries a scheme other
    /// than the supported ones.
    pub fn parse(raw: &str) -> Result<Self> {
        let (scheme, host) = parse_host(raw)?;
        Ok(Self { scheme, host })
    }

    /// Build a full URL string for the given path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}://{}{}", self.scheme, self.host, path)
        } else {
            format!("{}://{}/{}", self.scheme, self.host, path)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

/// Pick the host from a hostname or URL and detect its scheme.
///
/// The default scheme is HTTPS. `http://`, `ws://` and `wss://` prefixes
/// select the matching scheme; an explicit `https://` prefix is stripped.
///
/// # Errors
///
/// Returns [`CoreError::InvalidEndpoint`] for empty hosts, hosts with
/// whitespace, and values with an unsupported `scheme://` prefix.
pub fn parse_host(raw: &str) -> Result<(Scheme, String)> {
    let trimmed = raw.trim();

    let (scheme, rest) = Scheme::PREFIXES
        .iter()
        .find_map(|&(prefix, scheme)| trimmed.strip_prefix(prefix).map(|rest| (scheme, rest)))
        .unwrap_or_else(|| {
            (
                Scheme::Https,
                trimmed.strip_prefix("https://").unwrap_or(trimmed),
            )
        });

    let host = rest.trim_end_matches('/');
    if host.is_empty() {
        return Err(CoreError::invalid_endpoint(raw, "host is empty"));
    }
    if host.contains("://") {
        return Err(CoreError::invalid_endpoint(raw, "unsupported scheme"));
    }
    if host.chars().any(char::is_whitespace) {
        return Err(CoreError::invalid_endpoint(raw, "host contains whitespace"));
    }

    tracing::trace!(%scheme, host, "Resolved endpoint host");
    Ok((scheme, host.to_string()))
}

/// Return the configured path when set, otherwise the default.
///
/// Empty and whitespace-only values count as unset.
#[must_use]
pub fn resolve_path<'a>(configured: Option<&'a str>, default: &'a str) -> &'a str {
    match configured {
        Some(path) if !path.trim().is_empty() => path,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::REPORTER_SYSTEM_REPORT_PATH;

    #[test]
    fn test_parse_host_defaults_to_https() {
        let (scheme, host) = parse_host("api.example.com").unwrap();
        assert_eq!(scheme, Scheme::Https);
        assert_eq!(host, "api.example.com");
    }

    #[test]
    fn test_parse_host_strips_explicit_https() {
        let (scheme, host) = parse_host("https://api.example.com:8443").unwrap();
        assert_eq!(scheme, Scheme::Https);
        assert_eq!(host, "api.example.com:8443");
    }

    #[test]
    fn test_parse_host_detects_each_prefix() {
        assert_eq!(parse_host("http://h").unwrap().0, Scheme::Http);
        assert_eq!(parse_host("ws://h").unwrap().0, Scheme::Ws);
        assert_eq!(parse_host("wss://h").unwrap().0, Scheme::Wss);
    }

    #[test]
    fn test_parse_host_trims_trailing_slash() {
        let (_, host) = parse_host("http://localhost:8080/").unwrap();
        assert_eq!(host, "localhost:8080");
    }

    #[test]
    fn test_parse_host_rejects_empty() {
        assert!(parse_host("").is_err());
        assert!(parse_host("https://").is_err());
    }

    #[test]
    fn test_parse_host_rejects_unknown_scheme() {
        let err = parse_host("ftp://files.example.com").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_endpoint_url_for() {
        let endpoint = Endpoint::parse("http://localhost:7555").unwrap();
        assert_eq!(
            endpoint.url_for(REPORTER_SYSTEM_REPORT_PATH),
            "http://localhost:7555/k8s/sysreport"
        );
        assert_eq!(endpoint.url_for("k8s/x"), "http://localhost:7555/k8s/x");
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path(Some("/k8s/sysreport-test"), "/k8s/sysreport"), "/k8s/sysreport-test");
        assert_eq!(resolve_path(Some(""), "/k8s/sysreport"), "/k8s/sysreport");
        assert_eq!(resolve_path(None, "/k8s/sysreport"), "/k8s/sysreport");
    }
}
