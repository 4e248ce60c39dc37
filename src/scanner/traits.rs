//! Scanner contract
//!
//! A scanner enumerates one resource family in one account. Regional
//! scanners run once per configured region; global scanners run once per
//! account and receive the first configured region.

use crate::inventory::types::Credentials;
use crate::scanner::error::ScannerResult;
use crate::scanner::record::ResourceRecord;
use serde::Serialize;

/// Static description of a scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScannerDescriptor {
    /// Key under which records are aggregated, e.g. `ec2_instance`
    pub resource_type: &'static str,
    /// Human readable name, e.g. `EC2 Instance`
    pub display_name: &'static str,
    pub is_global: bool,
    /// Report column order; fields not listed here are appended alphabetically
    pub columns: &'static [&'static str],
}

impl ScannerDescriptor {
    /// Sheet or file stem used by report writers
    pub fn sheet_name(&self) -> String {
        self.display_name.replace(' ', "_")
    }
}

/// A resource family scanner
///
/// `invoke` either returns the complete record set for its scope or an
/// error. It may skip an individual resource it cannot describe, but a
/// failed listing call must fail the invocation.
#[async_trait::async_trait]
pub trait Scanner: Send + Sync {
    fn descriptor(&self) -> ScannerDescriptor;

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>>;
}
