//! Report error types

use crate::core::error_handling::ContextualError;

/// Failures while producing or publishing report artifacts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error during {operation} on '{path}': {cause}")]
    Io {
        operation: String,
        path: String,
        cause: String,
    },

    #[error("Failed to serialize report: {message}")]
    Serialization { message: String },

    #[error("Failed to upload '{key}' to bucket '{bucket}': {message}")]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },
}

impl ReportError {
    pub(crate) fn io(operation: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        ReportError::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            cause: err.to_string(),
        }
    }
}

impl ContextualError for ReportError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
