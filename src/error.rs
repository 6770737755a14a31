//! Error types for cacheprobe.
//!
//! Library modules return [`ProbeError`] through the local [`Result`] alias;
//! command handlers in the binary wrap these with `anyhow` context.

use thiserror::Error;

/// Convenience alias used throughout the library crate.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Errors surfaced by the probe library.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Filesystem or process I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The proxy answered with a non-success status.
    #[error("proxy returned HTTP {status}: {body}")]
    ProxyStatus {
        /// HTTP status code from the proxy.
        status: u16,
        /// Truncated response body for the report.
        body: String,
    },

    /// redis-cli could not be spawned or exited non-zero.
    #[error("redis-cli error: {0}")]
    Redis(String),

    /// External tool output did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration file or value problem.
    #[error("config error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_status_display() {
        let err = ProbeError::ProxyStatus {
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "proxy returned HTTP 401: invalid api key"
        );
    }

    #[test]
    fn test_redis_display() {
        let err = ProbeError::Redis("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ProbeError = io.into();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
