//! Inventory API
//!
//! Everything the application layer and alternative collaborators need.

pub use crate::inventory::aggregator::{
    AggregatedReport, AggregatorMessage, ResultAggregator, RunMetadata,
};
pub use crate::inventory::error::{
    DelegationError, DelegationResult, InventoryError, InventoryResult,
};
pub use crate::inventory::filter::AccountFilter;
pub use crate::inventory::orchestrator::ScanOrchestrator;
pub use crate::inventory::plan::{plan_work_units, UnitState, WorkUnitSpec};
pub use crate::inventory::progress::{LogProgress, NoProgress, ProgressObserver};
pub use crate::inventory::session::AccountSession;
pub use crate::inventory::settings::{ScanSettings, DEFAULT_MAX_CONCURRENCY};
pub use crate::inventory::traits::{CredentialDelegator, DirectoryService};
pub use crate::inventory::types::{
    Account, CallerIdentity, Credentials, FailureDescriptor, FailureScope, ScanOutcome,
};
