//! Work unit planning and lifecycle
//!
//! A work unit is one (account, scanner, region) invocation. Planning is a
//! pure function of its inputs, so the same accounts, registry and regions
//! always produce the same units in the same order.

use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::types::Account;
use crate::scanner::api::{ScannerDescriptor, ScannerRegistry};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkUnitSpec {
    pub account: Account,
    pub scanner: ScannerDescriptor,
    pub region: String,
}

impl WorkUnitSpec {
    pub fn account_id(&self) -> &str {
        &self.account.id
    }

    pub fn resource_type(&self) -> &'static str {
        self.scanner.resource_type
    }
}

impl fmt::Display for WorkUnitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.scanner.display_name, self.account, self.region
        )
    }
}

/// Expand accounts × scanners × regions into work units
///
/// Global scanners get exactly one unit per account, in the first region.
/// Order is account, then registry order, then region order.
pub fn plan_work_units(
    accounts: &[Account],
    registry: &ScannerRegistry,
    regions: &[String],
) -> Vec<WorkUnitSpec> {
    let Some(global_region) = regions.first() else {
        return Vec::new();
    };
    let descriptors = registry.descriptors();

    let mut units = Vec::new();
    for account in accounts {
        for scanner in &descriptors {
            let scanner_regions = if scanner.is_global {
                std::slice::from_ref(global_region)
            } else {
                regions
            };
            for region in scanner_regions {
                units.push(WorkUnitSpec {
                    account: account.clone(),
                    scanner: *scanner,
                    region: region.clone(),
                });
            }
        }
    }
    units
}

/// Lifecycle of a work unit; there is no way back and no retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum UnitState {
    Pending,
    CredentialsAcquired,
    Running,
    Succeeded,
    Failed,
}

impl UnitState {
    pub fn is_terminal(self) -> bool {
        matches!(self, UnitState::Succeeded | UnitState::Failed)
    }

    /// Move to `next`, rejecting anything outside the forward path
    ///
    /// Any non-terminal state may fail.
    pub fn advance(self, next: UnitState) -> InventoryResult<UnitState> {
        use UnitState::*;
        let allowed = matches!(
            (self, next),
            (Pending, CredentialsAcquired)
                | (CredentialsAcquired, Running)
                | (Running, Succeeded)
                | (Pending, Failed)
                | (CredentialsAcquired, Failed)
                | (Running, Failed)
        );
        if allowed {
            Ok(next)
        } else {
            Err(InventoryError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}
