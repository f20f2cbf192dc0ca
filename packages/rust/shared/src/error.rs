//! Error types for SiteCrawl.
//!
//! Library crates use [`SiteCrawlError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all SiteCrawl operations.
#[derive(Debug, thiserror::Error)]
pub enum SiteCrawlError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure (timeout, DNS, connection refused, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid input (bad seed URL, out-of-range limits, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SiteCrawlError>;

impl SiteCrawlError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SiteCrawlError::config("max_pages must be at least 1");
        assert_eq!(err.to_string(), "config error: max_pages must be at least 1");

        let err = SiteCrawlError::HttpStatus {
            url: "https://example.com/news".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 for https://example.com/news");
    }

    #[test]
    fn io_error_names_the_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = SiteCrawlError::io("/tmp/sitecrawl.toml", source);
        assert!(matches!(err, SiteCrawlError::Io { .. }));
        assert!(err.to_string().contains("/tmp/sitecrawl.toml"));
        assert!(err.to_string().contains("missing"));
    }
}
