//! Collaborator contracts used by the orchestrator

use crate::inventory::error::{DelegationResult, InventoryResult};
use crate::inventory::types::{Account, CallerIdentity, Credentials};

/// Turns the management identity into credentials for a member account
#[async_trait::async_trait]
pub trait CredentialDelegator: Send + Sync {
    /// Confirm the process is authenticated; failure aborts the run
    async fn verify_identity(&self) -> InventoryResult<CallerIdentity>;

    /// Credentials for the configured role in `account_id`
    async fn obtain(&self, account_id: &str) -> DelegationResult<Credentials>;
}

/// Enumerates active organization member accounts
///
/// Exclusions are not applied here; the orchestrator filters once before fan-out.
#[async_trait::async_trait]
pub trait DirectoryService: Send + Sync {
    async fn list_accounts(&self) -> InventoryResult<Vec<Account>>;
}
