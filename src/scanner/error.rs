//! Scanner error types

use crate::core::error_handling::ContextualError;
use crate::inventory::types::FailureScope;
use std::time::Duration;

/// Why one scanner invocation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScannerError {
    /// Service returned an error that is not classified further
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    #[error("access denied: {message}")]
    AccessDenied { message: String },

    /// Region not enabled for the account, or not reachable with these credentials
    #[error("region unavailable: {message}")]
    RegionUnavailable { message: String },

    #[error("timed out after {}ms", .limit.as_millis())]
    Timeout { limit: Duration },

    #[error("credentials unavailable: {message}")]
    Credentials { message: String },

    /// The scanner panicked or broke an internal invariant
    #[error("scanner failed unexpectedly: {message}")]
    Internal { message: String },
}

impl ScannerError {
    /// Classify a service error code
    pub fn from_code(code: Option<&str>, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            Some("AccessDenied")
            | Some("AccessDeniedException")
            | Some("UnauthorizedOperation")
            | Some("AuthorizationError") => ScannerError::AccessDenied { message },
            Some("OptInRequired") | Some("AuthFailure") | Some("InvalidClientTokenId") => {
                ScannerError::RegionUnavailable { message }
            }
            Some(code) => ScannerError::Api {
                code: code.to_string(),
                message,
            },
            None => ScannerError::Api {
                code: "Unknown".to_string(),
                message,
            },
        }
    }

    /// Failure scope recorded when this error ends a work unit
    pub fn scope(&self) -> FailureScope {
        match self {
            ScannerError::RegionUnavailable { .. } => FailureScope::AccountRegion,
            _ => FailureScope::AccountRegionScanner,
        }
    }
}

pub type ScannerResult<T> = Result<T, ScannerError>;

/// Problems building the scanner registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Scanner resource type '{resource_type}' is registered more than once")]
    DuplicateResourceType { resource_type: String },

    #[error("No scanners are registered")]
    Empty,
}

impl ContextualError for RegistryError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_classification() {
        assert!(matches!(
            ScannerError::from_code(Some("UnauthorizedOperation"), "nope"),
            ScannerError::AccessDenied { .. }
        ));
        assert!(matches!(
            ScannerError::from_code(Some("OptInRequired"), "not subscribed"),
            ScannerError::RegionUnavailable { .. }
        ));
        assert_eq!(
            ScannerError::from_code(Some("Throttling"), "Rate exceeded"),
            ScannerError::Api {
                code: "Throttling".to_string(),
                message: "Rate exceeded".to_string()
            }
        );
        assert_eq!(
            ScannerError::from_code(None, "dispatch failure").to_string(),
            "Unknown: dispatch failure"
        );
    }

    #[test]
    fn test_region_errors_widen_scope() {
        let err = ScannerError::RegionUnavailable {
            message: "AuthFailure".to_string(),
        };
        assert_eq!(err.scope(), FailureScope::AccountRegion);
        assert_eq!(
            ScannerError::Timeout {
                limit: Duration::from_secs(5)
            }
            .scope(),
            FailureScope::AccountRegionScanner
        );
    }
}
