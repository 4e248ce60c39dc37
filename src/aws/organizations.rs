//! Account directory backed by AWS Organizations

use crate::aws::context::AwsContext;
use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::traits::DirectoryService;
use crate::inventory::types::Account;
use aws_sdk_organizations::error::DisplayErrorContext;
use aws_sdk_organizations::types::AccountStatus;

pub struct OrganizationsDirectory {
    client: aws_sdk_organizations::Client,
}

impl OrganizationsDirectory {
    pub fn new(context: &AwsContext) -> Self {
        Self {
            client: aws_sdk_organizations::Client::new(context.base()),
        }
    }
}

#[async_trait::async_trait]
impl DirectoryService for OrganizationsDirectory {
    /// Every ACTIVE member account, sorted by id
    #[allow(deprecated)]
    async fn list_accounts(&self) -> InventoryResult<Vec<Account>> {
        let mut pages = self.client.list_accounts().into_paginator().send();
        let mut accounts = Vec::new();
        let mut inactive = 0usize;

        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| InventoryError::DirectoryUnavailable {
                message: DisplayErrorContext(&err).to_string(),
            })?;
            for account in page.accounts() {
                if account.status() != Some(&AccountStatus::Active) {
                    inactive += 1;
                    continue;
                }
                let Some(id) = account.id() else {
                    continue;
                };
                accounts.push(Account::new(id, account.name().unwrap_or(id)));
            }
        }

        accounts.sort();
        log::debug!(
            "Organization lists {} active accounts ({} suspended or closed)",
            accounts.len(),
            inactive
        );
        Ok(accounts)
    }
}
