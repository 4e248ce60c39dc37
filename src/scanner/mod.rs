//! Scanner Component
//!
//! One scanner per resource family, all implementing [`traits::Scanner`].
//!
//! ## Core pieces
//!
//! - **Scanner / ScannerDescriptor**: the invocation contract and its static metadata
//! - **ScannerRegistry**: the fixed, ordered scanner list for a run
//! - **ResourceRecord**: open field map returned by scanners
//! - **builtin**: the AWS scanners shipped with the tool, registered at link time

pub mod api;
pub mod builtin;
pub mod error;
pub mod fields;
pub mod record;
pub mod registry;
pub mod traits;

pub use error::{RegistryError, ScannerError, ScannerResult};
pub use registry::ScannerRegistry;
pub use traits::{Scanner, ScannerDescriptor};
