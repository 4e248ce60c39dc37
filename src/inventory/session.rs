//! Per-account credential holder shared by that account's work units

use crate::inventory::error::DelegationResult;
use crate::inventory::traits::CredentialDelegator;
use crate::inventory::types::{Account, Credentials};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Delegated credentials for one account
///
/// Units take a copy before invoking a scanner. If the held credentials have
/// expired the first unit to notice re-requests them under the lock, so
/// concurrent units for the same account trigger a single refresh.
pub struct AccountSession {
    account: Account,
    credentials: Mutex<Credentials>,
    delegator: Arc<dyn CredentialDelegator>,
}

impl AccountSession {
    pub fn new(
        account: Account,
        credentials: Credentials,
        delegator: Arc<dyn CredentialDelegator>,
    ) -> Self {
        Self {
            account,
            credentials: Mutex::new(credentials),
            delegator,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Current credentials, refreshed first if they have expired
    pub async fn credentials(&self) -> DelegationResult<Credentials> {
        let mut held = self.credentials.lock().await;
        if held.is_expired() {
            log::debug!(
                "Credentials for {} expired at {}; requesting new ones",
                self.account,
                held.expires_at()
            );
            *held = self.delegator.obtain(&self.account.id).await?;
        }
        Ok(held.clone())
    }
}
