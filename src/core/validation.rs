//! Validation of run parameters
//!
//! Every check here runs before any network call so that a bad setting fails
//! fast with exit status 2.

use crate::core::error_handling::ContextualError;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Split comma separated values, trim them, drop empties and duplicates
///
/// Order of first appearance is kept.
pub fn split_and_collect<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut result = Vec::new();
    for value in values {
        for part in value.as_ref().split(',') {
            let trimmed = part.trim();
            if !trimmed.is_empty() && seen.insert(trimmed.to_string()) {
                result.push(trimmed.to_string());
            }
        }
    }
    result
}

pub fn validate_positive_int(name: &str, value: &str) -> ValidationResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ValidationError::new(format!(
            "{} must be greater than 0",
            name
        ))),
        Ok(n) => Ok(n),
        Err(_) => Err(ValidationError::new(format!(
            "{}: '{}' is not a valid positive integer",
            name, value
        ))),
    }
}

/// Account ids are exactly twelve ASCII digits
pub fn validate_account_id(value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.len() == 12 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::new(format!(
            "'{}' is not a valid account id (expected 12 digits)",
            value
        )))
    }
}

/// Region names look like `us-east-1` or `ap-southeast-2`
pub fn validate_region(value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    let parts: Vec<&str> = trimmed.split('-').collect();
    let well_formed = parts.len() >= 3
        && parts[..parts.len() - 1]
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_lowercase()))
        && parts[parts.len() - 1]
            .bytes()
            .all(|b| b.is_ascii_digit())
        && !parts[parts.len() - 1].is_empty();
    if well_formed {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::new(format!(
            "'{}' is not a valid region name",
            value
        )))
    }
}

pub fn validate_regions(values: &[String]) -> ValidationResult<Vec<String>> {
    let regions = split_and_collect(values);
    if regions.is_empty() {
        return Err(ValidationError::new("at least one region is required"));
    }
    regions.iter().map(|r| validate_region(r)).collect()
}

/// Role names follow IAM naming rules: 1..=64 of `[A-Za-z0-9+=,.@_-]`
pub fn validate_role_name(value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    let allowed = |c: char| c.is_ascii_alphanumeric() || "+=,.@_-".contains(c);
    if trimmed.is_empty() || trimmed.len() > 64 || !trimmed.chars().all(allowed) {
        return Err(ValidationError::new(format!(
            "'{}' is not a valid role name",
            value
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_collect_dedups_and_trims() {
        let values = vec!["us-east-1, us-west-2", "us-east-1", " ", "eu-west-1,"];
        assert_eq!(
            split_and_collect(values),
            vec!["us-east-1", "us-west-2", "eu-west-1"]
        );
    }

    #[test]
    fn test_validate_positive_int() {
        assert_eq!(validate_positive_int("max-concurrency", "20").unwrap(), 20);
        assert!(validate_positive_int("max-concurrency", "0").is_err());
        assert!(validate_positive_int("max-concurrency", "-3").is_err());
        assert!(validate_positive_int("max-concurrency", "many").is_err());
    }

    #[test]
    fn test_validate_account_id() {
        assert_eq!(
            validate_account_id(" 123456789012 ").unwrap(),
            "123456789012"
        );
        assert!(validate_account_id("12345678901").is_err());
        assert!(validate_account_id("12345678901a").is_err());
    }

    #[test]
    fn test_validate_region() {
        assert!(validate_region("us-east-1").is_ok());
        assert!(validate_region("us-gov-west-1").is_ok());
        assert!(validate_region("US-EAST-1").is_err());
        assert!(validate_region("useast1").is_err());
        assert!(validate_region("us-east-").is_err());
    }

    #[test]
    fn test_validate_regions_rejects_empty_list() {
        let err = validate_regions(&[" , ".to_string()]).unwrap_err();
        assert_eq!(err.message(), "at least one region is required");
    }

    #[test]
    fn test_validate_role_name() {
        assert!(validate_role_name("AWSControlTowerExecution").is_ok());
        assert!(validate_role_name("").is_err());
        assert!(validate_role_name("bad/role").is_err());
    }

    #[test]
    fn test_validation_error_is_user_actionable() {
        let err = ValidationError::new("regions must not be empty");
        assert!(err.is_user_actionable());
        assert_eq!(err.user_message(), Some("regions must not be empty"));
    }
}
