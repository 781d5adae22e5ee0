//! Error handling module for postsweep
//!
//! Provides the error type shared by the notification and cache
//! collaborators. Errors with a narrower audience (criteria validation,
//! store transitions, scan failures, authorization) live next to the code
//! that raises them.

use thiserror::Error;

/// Main error type for postsweep
#[derive(Error, Debug)]
pub enum PostsweepError {
    /// IO errors (cache file, mail spool)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Notification channel failures
    #[error("Notification error: {0}")]
    Notify(String),

    /// Transient cache failures
    #[error("Cache error: {0}")]
    Cache(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for postsweep operations
pub type Result<T> = std::result::Result<T, PostsweepError>;

// Convenient error constructors
impl PostsweepError {
    /// Create a notification error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PostsweepError::cache("lock poisoned");
        assert_eq!(err.to_string(), "Cache error: lock poisoned");

        let err = PostsweepError::notify("mailbox full");
        assert_eq!(err.to_string(), "Notification error: mailbox full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PostsweepError = io_err.into();
        assert!(matches!(err, PostsweepError::Io(_)));
    }
}
