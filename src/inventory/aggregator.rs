//! Result aggregation
//!
//! Work units send their outcomes over an unbounded channel to a single
//! consumer task that owns the [`ResultAggregator`]. Nothing else mutates
//! it, so merging needs no locks. Records are bucketed by
//! `(account, region)` which makes the finalized report independent of
//! arrival order.

use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::types::{FailureDescriptor, ScanOutcome};
use crate::scanner::api::{ResourceRecord, ScannerDescriptor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;

/// What producers send to the aggregator
#[derive(Debug)]
pub enum AggregatorMessage {
    Outcome(ScanOutcome),
    /// Delegation failed; the account never produced units
    AccountFailure(FailureDescriptor),
}

type UnitKey = (&'static str, String, String);

/// Running state of a sweep
pub struct ResultAggregator {
    scanners: Vec<ScannerDescriptor>,
    buckets: BTreeMap<&'static str, BTreeMap<(String, String), Vec<ResourceRecord>>>,
    merged: BTreeSet<UnitKey>,
    failures: Vec<FailureDescriptor>,
    accounts: BTreeSet<String>,
    regions: BTreeSet<String>,
}

impl ResultAggregator {
    pub fn new(scanners: Vec<ScannerDescriptor>) -> Self {
        Self {
            scanners,
            buckets: BTreeMap::new(),
            merged: BTreeSet::new(),
            failures: Vec::new(),
            accounts: BTreeSet::new(),
            regions: BTreeSet::new(),
        }
    }

    /// Merge one terminal work unit
    ///
    /// A second outcome for the same scanner, account and region is rejected.
    pub fn merge(&mut self, outcome: ScanOutcome) -> InventoryResult<()> {
        let (scanner, account, region, records, failure) = outcome.into_parts();

        let key = (scanner.resource_type, account.id.clone(), region.clone());
        if self.merged.contains(&key) {
            return Err(InventoryError::DuplicateOutcome {
                resource_type: scanner.resource_type.to_string(),
                account_id: account.id,
                region,
            });
        }
        self.merged.insert(key);

        self.accounts.insert(account.id.clone());
        self.regions.insert(region.clone());

        match failure {
            Some(failure) => self.failures.push(failure),
            None => {
                self.buckets
                    .entry(scanner.resource_type)
                    .or_default()
                    .insert((account.id, region), records);
            }
        }
        Ok(())
    }

    pub fn record_account_failure(&mut self, failure: FailureDescriptor) {
        self.failures.push(failure);
    }

    /// Apply one message from a producer
    ///
    /// A duplicate outcome is logged and dropped; the first one merged wins.
    pub fn handle(&mut self, message: AggregatorMessage) {
        match message {
            AggregatorMessage::Outcome(outcome) => {
                if let Err(err) = self.merge(outcome) {
                    log::warn!("Dropping outcome: {}", err);
                }
            }
            AggregatorMessage::AccountFailure(failure) => self.record_account_failure(failure),
        }
    }

    pub fn units_merged(&self) -> usize {
        self.merged.len()
    }

    /// Move the aggregator into its consumer task
    ///
    /// The task ends once every sender is dropped and hands the aggregator
    /// back for finalization.
    pub fn spawn(
        self,
    ) -> (
        UnboundedSender<AggregatorMessage>,
        JoinHandle<ResultAggregator>,
    ) {
        let (tx, mut rx) = unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut aggregator = self;
            while let Some(message) = rx.recv().await {
                aggregator.handle(message);
            }
            aggregator
        });
        (tx, handle)
    }

    /// Freeze the accumulated state
    pub fn finalize(self, metadata: RunMetadata) -> AggregatedReport {
        let mut resources_by_scanner: BTreeMap<String, Vec<ResourceRecord>> = self
            .scanners
            .iter()
            .map(|s| (s.resource_type.to_string(), Vec::new()))
            .collect();
        for (resource_type, buckets) in self.buckets {
            let records = resources_by_scanner
                .entry(resource_type.to_string())
                .or_default();
            for bucket in buckets.into_values() {
                records.extend(bucket);
            }
        }

        AggregatedReport {
            units_completed: self.merged.len(),
            scanners: self.scanners,
            resources_by_scanner,
            failures: self.failures,
            accounts_scanned: self.accounts.len(),
            regions_scanned: self.regions.len(),
            accounts_total: metadata.accounts_total,
            accounts_excluded: metadata.accounts_excluded,
            units_planned: metadata.units_planned,
            interrupted: metadata.interrupted,
            started_at: metadata.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Facts about the run the aggregator cannot see in outcomes
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub accounts_total: usize,
    pub accounts_excluded: usize,
    pub units_planned: usize,
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
}

impl RunMetadata {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            accounts_total: 0,
            accounts_excluded: 0,
            units_planned: 0,
            interrupted: false,
            started_at,
        }
    }
}

/// Finalized inventory handed to report writers
///
/// `accounts_scanned` counts accounts whose credentials were obtained and
/// that had at least one unit reach a terminal state, failed or not.
/// `regions_scanned` counts distinct regions with a terminal unit.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedReport {
    scanners: Vec<ScannerDescriptor>,
    resources_by_scanner: BTreeMap<String, Vec<ResourceRecord>>,
    failures: Vec<FailureDescriptor>,
    accounts_scanned: usize,
    regions_scanned: usize,
    accounts_total: usize,
    accounts_excluded: usize,
    units_planned: usize,
    units_completed: usize,
    interrupted: bool,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl AggregatedReport {
    pub fn scanners(&self) -> &[ScannerDescriptor] {
        &self.scanners
    }

    pub fn resources_by_scanner(&self) -> &BTreeMap<String, Vec<ResourceRecord>> {
        &self.resources_by_scanner
    }

    pub fn records_for(&self, resource_type: &str) -> &[ResourceRecord] {
        self.resources_by_scanner
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count_for(&self, resource_type: &str) -> usize {
        self.records_for(resource_type).len()
    }

    pub fn total_resources(&self) -> usize {
        self.resources_by_scanner.values().map(Vec::len).sum()
    }

    /// Scanners with their record counts, largest first
    pub fn counts_descending(&self) -> Vec<(ScannerDescriptor, usize)> {
        let mut counts: Vec<_> = self
            .scanners
            .iter()
            .map(|s| (*s, self.count_for(s.resource_type)))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.display_name.cmp(b.0.display_name)));
        counts
    }

    pub fn failures(&self) -> &[FailureDescriptor] {
        &self.failures
    }

    pub fn accounts_scanned(&self) -> usize {
        self.accounts_scanned
    }

    pub fn regions_scanned(&self) -> usize {
        self.regions_scanned
    }

    pub fn accounts_total(&self) -> usize {
        self.accounts_total
    }

    pub fn accounts_excluded(&self) -> usize {
        self.accounts_excluded
    }

    pub fn units_planned(&self) -> usize {
        self.units_planned
    }

    pub fn units_completed(&self) -> usize {
        self.units_completed
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
