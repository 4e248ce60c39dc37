//! Inventory data model
//!
//! Accounts and scanner descriptors live for the whole run. Credentials,
//! outcomes and failure descriptors are created by one work unit and moved
//! on exactly once.

use crate::inventory::error::{DelegationError, DelegationResult};
use crate::scanner::api::{ResourceRecord, ScannerDescriptor};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials within this many seconds of expiry are treated as expired
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// An organization member account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub display_name: String,
}

impl Account {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.display_name)
    }
}

/// Who the process is running as before any delegation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
}

/// Short-lived credentials scoped to one account
///
/// A value of this type always has every field populated; construction
/// fails with [`DelegationError::Incomplete`] otherwise.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
    session_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> DelegationResult<Self> {
        let credentials = Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: session_token.into(),
            expires_at,
        };
        for (field, value) in [
            ("access key", &credentials.access_key),
            ("secret key", &credentials.secret_key),
            ("session token", &credentials.session_token),
        ] {
            if value.trim().is_empty() {
                return Err(DelegationError::Incomplete { field });
            }
        }
        Ok(credentials)
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// secrets stay out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// How much of the sweep a failure removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureScope {
    Account,
    AccountRegion,
    AccountRegionScanner,
}

impl FailureScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureScope::Account => "account",
            FailureScope::AccountRegion => "account-region",
            FailureScope::AccountRegionScanner => "account-region-scanner",
        }
    }
}

impl fmt::Display for FailureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A skipped account or work unit, ready to be shown to the operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FailureDescriptor {
    pub scope: FailureScope,
    pub account_id: String,
    pub identity: String,
    pub message: String,
}

impl FailureDescriptor {
    /// Delegation failed; nothing ran for this account
    pub fn account(account: &Account, message: impl Into<String>) -> Self {
        Self {
            scope: FailureScope::Account,
            account_id: account.id.clone(),
            identity: account.to_string(),
            message: message.into(),
        }
    }

    /// The region itself was unusable for this account
    pub fn account_region(
        account: &Account,
        region: &str,
        scanner: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scope: FailureScope::AccountRegion,
            account_id: account.id.clone(),
            identity: format!("{} - {} - {}", scanner, account, region),
            message: message.into(),
        }
    }

    /// One scanner failed in one account and region
    pub fn unit(
        account: &Account,
        region: &str,
        scanner: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            scope: FailureScope::AccountRegionScanner,
            account_id: account.id.clone(),
            identity: format!("{} - {} - {}", scanner, account, region),
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.identity, self.message)
    }
}

/// Result of one work unit
///
/// A failed outcome never carries records.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    scanner: ScannerDescriptor,
    account: Account,
    region: String,
    records: Vec<ResourceRecord>,
    failure: Option<FailureDescriptor>,
}

impl ScanOutcome {
    pub fn succeeded(
        scanner: ScannerDescriptor,
        account: Account,
        region: impl Into<String>,
        records: Vec<ResourceRecord>,
    ) -> Self {
        Self {
            scanner,
            account,
            region: region.into(),
            records,
            failure: None,
        }
    }

    pub fn failed(
        scanner: ScannerDescriptor,
        account: Account,
        region: impl Into<String>,
        failure: FailureDescriptor,
    ) -> Self {
        Self {
            scanner,
            account,
            region: region.into(),
            records: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn scanner(&self) -> &ScannerDescriptor {
        &self.scanner
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn failure(&self) -> Option<&FailureDescriptor> {
        self.failure.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        ScannerDescriptor,
        Account,
        String,
        Vec<ResourceRecord>,
        Option<FailureDescriptor>,
    ) {
        (
            self.scanner,
            self.account,
            self.region,
            self.records,
            self.failure,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_one_hour() -> DateTime<Utc> {
        Utc::now() + Duration::hours(1)
    }

    #[test]
    fn test_credentials_require_every_field() {
        assert!(Credentials::new("AKIA", "secret", "token", in_one_hour()).is_ok());
        assert_eq!(
            Credentials::new("AKIA", "", "token", in_one_hour()).unwrap_err(),
            DelegationError::Incomplete {
                field: "secret key"
            }
        );
        assert_eq!(
            Credentials::new("AKIA", "secret", "  ", in_one_hour()).unwrap_err(),
            DelegationError::Incomplete {
                field: "session token"
            }
        );
    }

    #[test]
    fn test_credentials_expiry_includes_skew() {
        let now = Utc::now();
        let creds = Credentials::new("AKIA", "secret", "token", now + Duration::seconds(30))
            .expect("complete credentials");
        assert!(creds.is_expired_at(now));

        let fresh = Credentials::new("AKIA", "secret", "token", now + Duration::minutes(10))
            .expect("complete credentials");
        assert!(!fresh.is_expired_at(now));
        assert!(fresh.is_expired_at(now + Duration::minutes(10)));
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials::new("AKIAEXAMPLE", "s3cr3t", "t0k3n", in_one_hour())
            .expect("complete credentials");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("s3cr3t"));
        assert!(!rendered.contains("t0k3n"));
    }

    #[test]
    fn test_failure_identity_formats() {
        let account = Account::new("111111111111", "Sandbox");
        let account_failure = FailureDescriptor::account(&account, "AccessDenied");
        assert_eq!(account_failure.identity, "111111111111 (Sandbox)");
        assert_eq!(account_failure.scope, FailureScope::Account);

        let unit = FailureDescriptor::unit(&account, "us-west-2", "EC2 Instance", "Throttling");
        assert_eq!(
            unit.to_string(),
            "EC2 Instance - 111111111111 (Sandbox) - us-west-2: Throttling"
        );
        assert_eq!(unit.scope.as_str(), "account-region-scanner");
    }

    #[test]
    fn test_failure_scope_serializes_kebab_case() {
        let json = serde_json::to_string(&FailureScope::AccountRegion).expect("serialize");
        assert_eq!(json, "\"account-region\"");
    }
}
