//! Error types and result aliases for Derrick operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the Derrick workspace with actionable error messages.

use thiserror::Error;

/// Unified error type for all Derrick operations
#[derive(Error, Debug)]
pub enum DerrickError {
    // Engine errors
    #[error("Hoisting produced an inconsistent layout:\n{log}")]
    LayoutCheckFailed { log: String, dump: String },

    // Graph input errors
    #[error("Failed to parse dependency graph: {message}")]
    JsonParse { message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Derrick operations
pub type DerrickResult<T> = Result<T, DerrickError>;

impl DerrickError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DerrickError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            DerrickError::LayoutCheckFailed { .. } => {
                Some("This is a bug in the hoister; re-run with --debug-level 9 and attach the dump to a bug report")
            },
            DerrickError::JsonParse { .. } => {
                Some("Check that the graph file matches the documented JSON shape")
            },
            DerrickError::Io { .. } => Some("Check that the path exists and is readable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_check_failed_display() {
        let error = DerrickError::LayoutCheckFailed {
            log: "A@1: broken require promise for B@1".to_string(),
            dump: ".\n└─A@1\n".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("inconsistent layout"));
        assert!(message.contains("broken require promise"));
    }

    #[test]
    fn test_suggestions() {
        let error = DerrickError::JsonParse {
            message: "expected value at line 1".to_string(),
        };
        assert!(error.suggestion().unwrap().contains("JSON shape"));

        let error = DerrickError::io(
            "Failed to read graph.json".to_string(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_recoverability() {
        let io = DerrickError::io(
            "Failed to read graph.json".to_string(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(io.is_recoverable());

        let broken = DerrickError::LayoutCheckFailed {
            log: "broken".to_string(),
            dump: String::new(),
        };
        assert!(!broken.is_recoverable());
    }
}
