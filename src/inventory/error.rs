//! Inventory error types
//!
//! `InventoryError` is reserved for conditions that end the whole run.
//! `DelegationError` only ever removes one account from the sweep.

use crate::core::error_handling::ContextualError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    #[error("Unable to verify the management identity: {message}")]
    IdentityVerification { message: String },

    #[error("Unable to list organization accounts: {message}")]
    DirectoryUnavailable { message: String },

    #[error("Invalid scan configuration: {message}")]
    Configuration { message: String },

    #[error("Outcome for {resource_type} in {account_id}/{region} was already merged")]
    DuplicateOutcome {
        resource_type: String,
        account_id: String,
        region: String,
    },

    #[error("Illegal work unit transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Result aggregator stopped: {message}")]
    Aggregator { message: String },
}

impl ContextualError for InventoryError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, InventoryError::Configuration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            InventoryError::Configuration { message } => Some(message),
            _ => None,
        }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Failure to obtain delegated credentials for one account
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DelegationError {
    #[error("access denied assuming role in {account_id}: {message}")]
    AccessDenied { account_id: String, message: String },

    #[error("unable to assume role in {account_id}: {message}")]
    Failed { account_id: String, message: String },

    #[error("delegated credentials are missing {field}")]
    Incomplete { field: &'static str },
}

impl DelegationError {
    /// Access-denied failures are logged quietly; the role is often simply absent
    pub fn is_access_denied(&self) -> bool {
        matches!(self, DelegationError::AccessDenied { .. })
    }
}

pub type DelegationResult<T> = Result<T, DelegationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_errors_are_user_actionable() {
        let config = InventoryError::Configuration {
            message: "regions must not be empty".to_string(),
        };
        assert!(config.is_user_actionable());
        assert_eq!(config.user_message(), Some("regions must not be empty"));

        let directory = InventoryError::DirectoryUnavailable {
            message: "AWSOrganizationsNotInUseException".to_string(),
        };
        assert!(!directory.is_user_actionable());
        assert_eq!(directory.user_message(), None);
    }

    #[test]
    fn test_delegation_error_display() {
        let err = DelegationError::AccessDenied {
            account_id: "111111111111".to_string(),
            message: "not authorized to perform sts:AssumeRole".to_string(),
        };
        assert!(err.is_access_denied());
        assert_eq!(
            err.to_string(),
            "access denied assuming role in 111111111111: not authorized to perform sts:AssumeRole"
        );
        assert!(!DelegationError::Incomplete {
            field: "session token"
        }
        .is_access_denied());
    }
}
