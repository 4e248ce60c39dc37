//! Credential delegation through STS role assumption

use crate::aws::context::AwsContext;
use crate::inventory::error::{
    DelegationError, DelegationResult, InventoryError, InventoryResult,
};
use crate::inventory::traits::CredentialDelegator;
use crate::inventory::types::{CallerIdentity, Credentials};
use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use chrono::{DateTime, Utc};

/// Default delegated credential lifetime in seconds
pub const DEFAULT_SESSION_DURATION: u32 = 3600;

/// Assumes a fixed role name in each member account
pub struct StsDelegator {
    client: aws_sdk_sts::Client,
    role_name: String,
    session_duration: u32,
}

impl StsDelegator {
    pub fn new(context: &AwsContext, role_name: impl Into<String>, session_duration: u32) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(context.base()),
            role_name: role_name.into(),
            session_duration,
        }
    }

    pub fn role_arn(&self, account_id: &str) -> String {
        format!("arn:aws:iam::{}:role/{}", account_id, self.role_name)
    }
}

fn session_name(account_id: &str) -> String {
    format!("org-inventory-{}", account_id)
}

#[async_trait::async_trait]
impl CredentialDelegator for StsDelegator {
    async fn verify_identity(&self) -> InventoryResult<CallerIdentity> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| InventoryError::IdentityVerification {
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(CallerIdentity {
            account: output.account().unwrap_or_default().to_string(),
            arn: output.arn().unwrap_or_default().to_string(),
        })
    }

    async fn obtain(&self, account_id: &str) -> DelegationResult<Credentials> {
        let role_arn = self.role_arn(account_id);
        log::trace!("Assuming {}", role_arn);

        let output = self
            .client
            .assume_role()
            .role_arn(&role_arn)
            .role_session_name(session_name(account_id))
            .duration_seconds(self.session_duration as i32)
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                match err.code() {
                    Some("AccessDenied") => DelegationError::AccessDenied {
                        account_id: account_id.to_string(),
                        message,
                    },
                    _ => DelegationError::Failed {
                        account_id: account_id.to_string(),
                        message,
                    },
                }
            })?;

        let issued = output
            .credentials()
            .ok_or(DelegationError::Incomplete {
                field: "credentials",
            })?;
        let expiration = issued.expiration();
        let expires_at: DateTime<Utc> =
            DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos()).ok_or(
                DelegationError::Incomplete {
                    field: "expiration",
                },
            )?;

        Credentials::new(
            issued.access_key_id(),
            issued.secret_access_key(),
            issued.session_token(),
            expires_at,
        )
    }
}
