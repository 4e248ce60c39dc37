//! Scanner API
//!
//! Public surface of the scanner subsystem, used by the inventory core and
//! by anyone implementing additional scanners.

pub use crate::scanner::error::{
    RegistryError, RegistryResult, ScannerError, ScannerResult,
};
pub use crate::scanner::fields::{format_tags, format_timestamp, name_from_tags, NOT_AVAILABLE};
pub use crate::scanner::record::ResourceRecord;
pub use crate::scanner::registry::{BuiltinScannerEntry, ScannerRegistry};
pub use crate::scanner::traits::{Scanner, ScannerDescriptor};
