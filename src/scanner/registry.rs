//! Scanner registry
//!
//! Builtin scanners register themselves at link time with the
//! `builtin_scanner!` macro. The registry is assembled once at startup and
//! never changes afterwards.

use crate::aws::context::AwsContext;
use crate::scanner::error::{RegistryError, RegistryResult};
use crate::scanner::traits::{Scanner, ScannerDescriptor};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Link-time registration entry for a builtin scanner
pub struct BuiltinScannerEntry {
    pub factory: fn(&AwsContext) -> Arc<dyn Scanner>,
}

::inventory::collect!(BuiltinScannerEntry);

/// Register a builtin scanner factory
#[macro_export]
macro_rules! builtin_scanner {
    ($factory_expr:expr) => {
        ::inventory::submit!($crate::scanner::registry::BuiltinScannerEntry {
            factory: $factory_expr
        });
    };
}

/// Ordered, immutable set of scanners for one run
#[derive(Clone)]
pub struct ScannerRegistry {
    scanners: Vec<Arc<dyn Scanner>>,
}

impl ScannerRegistry {
    /// Build a registry from an explicit list, keeping its order
    pub fn from_scanners(scanners: Vec<Arc<dyn Scanner>>) -> RegistryResult<Self> {
        if scanners.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = BTreeSet::new();
        for scanner in &scanners {
            let resource_type = scanner.descriptor().resource_type;
            if !seen.insert(resource_type) {
                return Err(RegistryError::DuplicateResourceType {
                    resource_type: resource_type.to_string(),
                });
            }
        }
        Ok(Self { scanners })
    }

    /// Every builtin scanner, ordered by resource type
    pub fn builtin(context: &AwsContext) -> RegistryResult<Self> {
        let mut scanners: Vec<Arc<dyn Scanner>> = ::inventory::iter::<BuiltinScannerEntry>()
            .map(|entry| (entry.factory)(context))
            .collect();
        scanners.sort_by_key(|s| s.descriptor().resource_type);
        log::debug!("Registered {} builtin scanners", scanners.len());
        Self::from_scanners(scanners)
    }

    pub fn descriptors(&self) -> Vec<ScannerDescriptor> {
        self.scanners.iter().map(|s| s.descriptor()).collect()
    }

    pub fn get(&self, resource_type: &str) -> Option<Arc<dyn Scanner>> {
        self.scanners
            .iter()
            .find(|s| s.descriptor().resource_type == resource_type)
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Scanner>> {
        self.scanners.iter()
    }

    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}

impl std::fmt::Debug for ScannerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.scanners.iter().map(|s| s.descriptor().resource_type))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::types::Credentials;
    use crate::scanner::error::ScannerResult;
    use crate::scanner::record::ResourceRecord;

    struct Fixed(ScannerDescriptor);

    #[async_trait::async_trait]
    impl Scanner for Fixed {
        fn descriptor(&self) -> ScannerDescriptor {
            self.0
        }

        async fn invoke(
            &self,
            _credentials: &Credentials,
            _account_id: &str,
            _account_name: &str,
            _region: &str,
        ) -> ScannerResult<Vec<ResourceRecord>> {
            Ok(Vec::new())
        }
    }

    fn scanner(resource_type: &'static str, is_global: bool) -> Arc<dyn Scanner> {
        Arc::new(Fixed(ScannerDescriptor {
            resource_type,
            display_name: resource_type,
            is_global,
            columns: &[],
        }))
    }

    #[test]
    fn test_from_scanners_keeps_order() {
        let registry =
            ScannerRegistry::from_scanners(vec![scanner("vpc", false), scanner("iam_role", true)])
                .expect("valid registry");
        let types: Vec<_> = registry
            .descriptors()
            .iter()
            .map(|d| d.resource_type)
            .collect();
        assert_eq!(types, vec!["vpc", "iam_role"]);
        assert!(registry.get("iam_role").is_some());
        assert!(registry.get("s3_bucket").is_none());
    }

    #[test]
    fn test_duplicate_resource_type_rejected() {
        let err = ScannerRegistry::from_scanners(vec![scanner("vpc", false), scanner("vpc", true)])
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateResourceType {
                resource_type: "vpc".to_string()
            }
        );
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert_eq!(
            ScannerRegistry::from_scanners(Vec::new()).unwrap_err(),
            RegistryError::Empty
        );
    }

    #[test]
    fn test_builtin_registry_contents() {
        let registry = ScannerRegistry::builtin(&AwsContext::offline()).expect("builtin registry");
        let descriptors = registry.descriptors();
        let types: Vec<_> = descriptors.iter().map(|d| d.resource_type).collect();
        assert_eq!(
            types,
            vec![
                "ebs_volume",
                "ec2_instance",
                "elastic_ip",
                "iam_role",
                "lambda_function",
                "s3_bucket",
                "security_group",
                "vpc",
            ]
        );
        let globals: Vec<_> = descriptors
            .iter()
            .filter(|d| d.is_global)
            .map(|d| d.resource_type)
            .collect();
        assert_eq!(globals, vec!["iam_role", "s3_bucket"]);
        assert!(descriptors.iter().all(|d| !d.columns.is_empty()));
    }
}
