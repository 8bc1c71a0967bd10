//! Error types for spoketome.
//!
//! Library crates use [`SpoketomeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all spoketome operations.
#[derive(Debug, thiserror::Error)]
pub enum SpoketomeError {
    /// Configuration loading or validation error (missing token, bad config file).
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the Notion API.
    #[error("network error: {0}")]
    Network(String),

    /// Response or manifest content that could not be parsed.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpoketomeError>;

impl SpoketomeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
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
        let err = SpoketomeError::config("NOTION_TOKEN is not set");
        assert_eq!(err.to_string(), "config error: NOTION_TOKEN is not set");

        let err = SpoketomeError::Network("https://api.notion.com: HTTP 404".into());
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn io_error_includes_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SpoketomeError::io("/tmp/missing/.spoketome", source);
        let msg = err.to_string();
        assert!(msg.contains(".spoketome"));
        assert!(msg.contains("gone"));
    }
}
