//! Account exclusion policy

use crate::inventory::types::Account;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    excluded: BTreeSet<String>,
}

impl AccountFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_allowed(&self, account_id: &str) -> bool {
        !self.excluded.contains(account_id)
    }

    /// Split into allowed accounts and the number excluded
    ///
    /// The allowed list keeps input order and is always a subset of the input.
    pub fn partition(&self, accounts: Vec<Account>) -> (Vec<Account>, usize) {
        let total = accounts.len();
        let allowed: Vec<Account> = accounts
            .into_iter()
            .filter(|account| self.is_allowed(&account.id))
            .collect();
        let excluded = total - allowed.len();
        (allowed, excluded)
    }
}
