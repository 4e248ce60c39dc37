//! Run parameters consumed by the orchestrator

use crate::inventory::error::{InventoryError, InventoryResult};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default ceiling on simultaneously running work units
pub const DEFAULT_MAX_CONCURRENCY: usize = 20;

#[derive(Debug, Clone)]
pub struct ScanSettings {
    regions: Vec<String>,
    max_concurrency: usize,
    excluded_accounts: BTreeSet<String>,
    unit_timeout: Option<Duration>,
}

impl ScanSettings {
    /// Regions must be non-empty and the concurrency ceiling positive
    ///
    /// Repeated regions are dropped, keeping the first occurrence, so each
    /// (account, region, scanner) unit is planned once.
    pub fn new(regions: Vec<String>, max_concurrency: usize) -> InventoryResult<Self> {
        let mut seen = BTreeSet::new();
        let regions: Vec<String> = regions
            .into_iter()
            .filter(|region| seen.insert(region.clone()))
            .collect();
        if regions.is_empty() {
            return Err(InventoryError::Configuration {
                message: "at least one region is required".to_string(),
            });
        }
        if max_concurrency == 0 {
            return Err(InventoryError::Configuration {
                message: "max-concurrency must be greater than 0".to_string(),
            });
        }
        Ok(Self {
            regions,
            max_concurrency,
            excluded_accounts: BTreeSet::new(),
            unit_timeout: None,
        })
    }

    pub fn with_excluded_accounts<I, S>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.unit_timeout = timeout;
        self
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn excluded_accounts(&self) -> &BTreeSet<String> {
        &self.excluded_accounts
    }

    pub fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_regions_and_zero_concurrency() {
        assert!(ScanSettings::new(Vec::new(), 5).is_err());
        assert!(ScanSettings::new(vec!["us-east-1".to_string()], 0).is_err());
    }

    #[test]
    fn test_repeated_regions_are_dropped_in_order() {
        let regions = ["us-west-2", "us-east-1", "us-west-2"]
            .iter()
            .map(|r| r.to_string())
            .collect();
        let settings = ScanSettings::new(regions, 2).expect("valid settings");
        assert_eq!(settings.regions(), ["us-west-2", "us-east-1"]);
    }

    #[test]
    fn test_builder_methods() {
        let settings = ScanSettings::new(vec!["us-east-1".to_string()], 4)
            .expect("valid settings")
            .with_excluded_accounts(["111111111111"])
            .with_unit_timeout(Some(Duration::from_secs(30)));
        assert_eq!(settings.max_concurrency(), 4);
        assert!(settings.excluded_accounts().contains("111111111111"));
        assert_eq!(settings.unit_timeout(), Some(Duration::from_secs(30)));
    }
}
