use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for announce operations
#[derive(Error, Debug)]
pub enum AnnounceError {
    #[error("Invalid current version: {0}")]
    InvalidCurrentVersion(String),

    #[error("Version component overflow: {0}")]
    VersionOverflow(String),

    #[error("Unknown series: {0}")]
    InvalidSeries(String),

    #[error("Invalid version ladder: {0}")]
    InvalidLadder(String),

    #[error("Cannot read ignore file {}: {source}", path.display())]
    IgnoreFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ignore rule: {0}")]
    IgnoreRule(#[from] ignore::Error),

    #[error("Version replacement failed in {failed} file(s) ({changed} file(s) changed)")]
    PartialReplacementFailure { failed: usize, changed: usize },

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported git host: {0}")]
    UnsupportedHost(String),

    #[error("Git host request failed: {0}")]
    Host(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in announce
pub type Result<T> = std::result::Result<T, AnnounceError>;

impl AnnounceError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        AnnounceError::Config(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        AnnounceError::Manifest(msg.into())
    }

    /// Create a git host error with context
    pub fn host(msg: impl Into<String>) -> Self {
        AnnounceError::Host(msg.into())
    }

    /// Create a template error with context
    pub fn template(msg: impl Into<String>) -> Self {
        AnnounceError::Template(msg.into())
    }

    /// Create a publish error with context
    pub fn publish(msg: impl Into<String>) -> Self {
        AnnounceError::Publish(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnnounceError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AnnounceError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_ignore_file_unreadable_names_path() {
        let err = AnnounceError::IgnoreFileUnreadable {
            path: PathBuf::from("/tmp/project/.gitignore"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/project/.gitignore"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_partial_failure_counts() {
        let err = AnnounceError::PartialReplacementFailure {
            failed: 2,
            changed: 5,
        };
        assert_eq!(
            err.to_string(),
            "Version replacement failed in 2 file(s) (5 file(s) changed)"
        );
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (AnnounceError::config("x"), "Configuration error"),
            (AnnounceError::manifest("x"), "Manifest error"),
            (AnnounceError::host("x"), "Git host request failed"),
            (AnnounceError::template("x"), "Template error"),
            (AnnounceError::publish("x"), "Publish failed"),
            (
                AnnounceError::InvalidSeries("weekly".to_string()),
                "Unknown series",
            ),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
