//! Scan orchestration
//!
//! A run verifies the caller, lists and filters accounts, obtains delegated
//! credentials per account, then fans the planned work units out under a
//! single concurrency ceiling. Every unit ends as exactly one outcome sent to
//! the aggregator task. Failures stay local to the unit (or account) that
//! produced them; only identity and directory errors end the run.

use crate::inventory::aggregator::{
    AggregatedReport, AggregatorMessage, ResultAggregator, RunMetadata,
};
use crate::inventory::error::{InventoryError, InventoryResult};
use crate::inventory::filter::AccountFilter;
use crate::inventory::plan::{plan_work_units, UnitState, WorkUnitSpec};
use crate::inventory::progress::{NoProgress, ProgressObserver};
use crate::inventory::session::AccountSession;
use crate::inventory::settings::ScanSettings;
use crate::inventory::traits::{CredentialDelegator, DirectoryService};
use crate::inventory::types::{Account, FailureDescriptor, FailureScope, ScanOutcome};
use crate::scanner::api::{ResourceRecord, Scanner, ScannerError, ScannerRegistry, ScannerResult};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

type Sessions = BTreeMap<String, Arc<AccountSession>>;

/// A planned unit with everything it needs to run
struct BoundUnit {
    spec: WorkUnitSpec,
    session: Arc<AccountSession>,
    scanner: Arc<dyn Scanner>,
}

pub struct ScanOrchestrator {
    delegator: Arc<dyn CredentialDelegator>,
    directory: Arc<dyn DirectoryService>,
    registry: Arc<ScannerRegistry>,
    settings: ScanSettings,
    progress: Arc<dyn ProgressObserver>,
}

impl ScanOrchestrator {
    pub fn new(
        delegator: Arc<dyn CredentialDelegator>,
        directory: Arc<dyn DirectoryService>,
        registry: Arc<ScannerRegistry>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            delegator,
            directory,
            registry,
            settings,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Run one sweep of the organization
    ///
    /// A message on `shutdown_rx` stops new work, abandons running units and
    /// returns the partial report marked as interrupted.
    pub async fn run(
        &self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> InventoryResult<AggregatedReport> {
        let mut metadata = RunMetadata::new(Utc::now());

        let identity = self.delegator.verify_identity().await?;
        log::info!("Running as {} in account {}", identity.arn, identity.account);

        let accounts = self.directory.list_accounts().await?;
        metadata.accounts_total = accounts.len();
        let filter = AccountFilter::new(self.settings.excluded_accounts().iter().cloned());
        let (allowed, excluded) = filter.partition(accounts);
        metadata.accounts_excluded = excluded;
        self.progress.accounts_resolved(allowed.len(), excluded);

        let (tx, consumer) = ResultAggregator::new(self.registry.descriptors()).spawn();

        let (sessions, mut interrupted) = self.delegate(allowed, &tx, &mut shutdown_rx).await;

        if !interrupted {
            let accounts: Vec<Account> = sessions.values().map(|s| s.account().clone()).collect();
            let units = self.bind(
                plan_work_units(&accounts, &self.registry, self.settings.regions()),
                &sessions,
            );
            metadata.units_planned = units.len();
            self.progress.units_planned(units.len());
            interrupted = self.execute(units, &tx, &mut shutdown_rx).await;
        }

        drop(tx);
        let aggregator = consumer.await.map_err(|e| InventoryError::Aggregator {
            message: e.to_string(),
        })?;
        self.progress.finished();

        metadata.interrupted = interrupted;
        let report = aggregator.finalize(metadata);
        if interrupted {
            log::warn!(
                "Sweep interrupted after {} of {} work units",
                report.units_completed(),
                report.units_planned()
            );
        } else {
            log::info!(
                "Sweep finished: {} resources, {} failures",
                report.total_resources(),
                report.failures().len()
            );
        }
        Ok(report)
    }

    /// Obtain credentials for every allowed account
    ///
    /// Accounts that cannot be assumed into are reported and skipped.
    async fn delegate(
        &self,
        accounts: Vec<Account>,
        tx: &UnboundedSender<AggregatorMessage>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> (Sessions, bool) {
        let mut sessions = Sessions::new();
        let mut attempts = stream::iter(accounts.into_iter().map(|account| {
            let delegator = self.delegator.clone();
            async move {
                let result = delegator.obtain(&account.id).await;
                (account, result)
            }
        }))
        .buffer_unordered(self.settings.max_concurrency());

        loop {
            tokio::select! {
                biased;
                _ = shutdown_signalled(shutdown_rx) => {
                    log::warn!("Interrupted while obtaining account credentials");
                    return (sessions, true);
                }
                next = attempts.next() => match next {
                    Some((account, Ok(credentials))) => {
                        log::debug!("Obtained credentials for {}", account);
                        let id = account.id.clone();
                        let session = AccountSession::new(account, credentials, self.delegator.clone());
                        sessions.insert(id, Arc::new(session));
                    }
                    Some((account, Err(err))) => {
                        if err.is_access_denied() {
                            log::debug!("Skipping {}: {}", account, err);
                        } else {
                            log::warn!("Skipping {}: {}", account, err);
                        }
                        let failure = FailureDescriptor::account(&account, err.to_string());
                        let _ = tx.send(AggregatorMessage::AccountFailure(failure));
                    }
                    None => return (sessions, false),
                }
            }
        }
    }

    fn bind(&self, units: Vec<WorkUnitSpec>, sessions: &Sessions) -> Vec<BoundUnit> {
        units
            .into_iter()
            .filter_map(|spec| {
                let session = sessions.get(spec.account_id())?.clone();
                let Some(scanner) = self.registry.get(spec.resource_type()) else {
                    log::error!("No scanner registered for {}", spec.resource_type());
                    return None;
                };
                Some(BoundUnit {
                    spec,
                    session,
                    scanner,
                })
            })
            .collect()
    }

    /// Run units until the queue drains or shutdown is requested
    ///
    /// Returns true when interrupted.
    async fn execute(
        &self,
        units: Vec<BoundUnit>,
        tx: &UnboundedSender<AggregatorMessage>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> bool {
        let total = units.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency()));
        let mut queue: VecDeque<BoundUnit> = units.into();
        let mut running = JoinSet::new();
        let mut completed = 0usize;

        loop {
            if queue.is_empty() && running.is_empty() {
                return false;
            }
            tokio::select! {
                biased;
                _ = shutdown_signalled(shutdown_rx) => {
                    log::warn!(
                        "Abandoning {} running and {} queued work units",
                        running.len(),
                        queue.len()
                    );
                    running.abort_all();
                    while running.join_next().await.is_some() {}
                    return true;
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    if let Err(err) = joined {
                        log::error!("Work unit task ended abnormally: {}", err);
                    }
                    completed += 1;
                    self.progress.unit_finished(completed, total);
                }
                permit = semaphore.clone().acquire_owned(), if !queue.is_empty() => {
                    match (permit, queue.pop_front()) {
                        (Ok(permit), Some(unit)) => {
                            running.spawn(execute_unit(
                                unit,
                                self.settings.unit_timeout(),
                                tx.clone(),
                                permit,
                            ));
                        }
                        (Err(err), _) => {
                            log::error!("Concurrency limiter closed: {}", err);
                            return false;
                        }
                        (Ok(_), None) => {}
                    }
                }
            }
        }
    }
}

/// Resolves when shutdown is requested; never resolves if the sender is gone
async fn shutdown_signalled(rx: &mut broadcast::Receiver<()>) {
    match rx.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => std::future::pending::<()>().await,
    }
}

async fn execute_unit(
    unit: BoundUnit,
    timeout: Option<Duration>,
    tx: UnboundedSender<AggregatorMessage>,
    _permit: OwnedSemaphorePermit,
) {
    let BoundUnit {
        spec,
        session,
        scanner,
    } = unit;
    let mut state = UnitState::Pending;

    let outcome = match run_unit(&spec, &session, scanner.as_ref(), timeout, &mut state).await {
        Ok(records) => {
            log::debug!("{}: {} resources", spec, records.len());
            ScanOutcome::succeeded(spec.scanner, spec.account, spec.region, records)
        }
        Err(err) => {
            if let Ok(next) = state.advance(UnitState::Failed) {
                state = next;
            }
            log::warn!("{}: {}", spec, err);
            log::trace!("{}: {}", spec, state);
            let failure = failure_for(&spec, &err);
            ScanOutcome::failed(spec.scanner, spec.account, spec.region, failure)
        }
    };
    let _ = tx.send(AggregatorMessage::Outcome(outcome));
}

async fn run_unit(
    spec: &WorkUnitSpec,
    session: &AccountSession,
    scanner: &dyn Scanner,
    timeout: Option<Duration>,
    state: &mut UnitState,
) -> ScannerResult<Vec<ResourceRecord>> {
    let credentials = session
        .credentials()
        .await
        .map_err(|e| ScannerError::Credentials {
            message: e.to_string(),
        })?;
    transition(spec, state, UnitState::CredentialsAcquired)?;
    transition(spec, state, UnitState::Running)?;

    let invocation = AssertUnwindSafe(scanner.invoke(
        &credentials,
        &spec.account.id,
        &spec.account.display_name,
        &spec.region,
    ))
    .catch_unwind();

    let caught = match timeout {
        Some(limit) => tokio::time::timeout(limit, invocation)
            .await
            .map_err(|_| ScannerError::Timeout { limit })?,
        None => invocation.await,
    };
    let records = caught.map_err(|payload| ScannerError::Internal {
        message: panic_message(payload.as_ref()),
    })??;

    transition(spec, state, UnitState::Succeeded)?;
    Ok(records)
}

fn transition(spec: &WorkUnitSpec, state: &mut UnitState, next: UnitState) -> ScannerResult<()> {
    *state = state.advance(next).map_err(|e| ScannerError::Internal {
        message: e.to_string(),
    })?;
    log::trace!("{}: {}", spec, state);
    Ok(())
}

fn failure_for(spec: &WorkUnitSpec, err: &ScannerError) -> FailureDescriptor {
    let scanner = spec.scanner.display_name;
    match err.scope() {
        FailureScope::AccountRegion => {
            FailureDescriptor::account_region(&spec.account, &spec.region, scanner, err.to_string())
        }
        _ => FailureDescriptor::unit(&spec.account, &spec.region, scanner, err.to_string()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "scanner panicked".to_string()
    }
}
