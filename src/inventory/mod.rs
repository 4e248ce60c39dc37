//! Inventory core
//!
//! Delegation, planning, bounded fan-out of work units and aggregation of
//! their outcomes into a single report. The AWS specifics live behind the
//! [`CredentialDelegator`](traits::CredentialDelegator) and
//! [`DirectoryService`](traits::DirectoryService) contracts.

pub mod aggregator;
pub mod api;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod plan;
pub mod progress;
pub mod session;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{DelegationError, InventoryError, InventoryResult};
pub use orchestrator::ScanOrchestrator;
pub use settings::ScanSettings;
