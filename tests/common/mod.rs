//! Common test utilities
//!
//! In-memory stand-ins for the AWS collaborators and scriptable scanners.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use org_inventory::inventory::api::{
    Account, CallerIdentity, CredentialDelegator, Credentials, DelegationError,
    DelegationResult, DirectoryService, InventoryError, InventoryResult, ScanOrchestrator,
    ScanSettings,
};
use org_inventory::scanner::api::{
    ResourceRecord, Scanner, ScannerDescriptor, ScannerRegistry, ScannerResult,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ACCOUNT_A: &str = "111111111111";
pub const ACCOUNT_B: &str = "222222222222";
pub const ACCOUNT_C: &str = "333333333333";
pub const R1: &str = "us-east-1";
pub const R2: &str = "us-west-2";

pub fn accounts(ids: &[&str]) -> Vec<Account> {
    ids.iter()
        .map(|id| Account::new(*id, format!("account-{}", &id[..3])))
        .collect()
}

pub fn regions(names: &[&str]) -> Vec<String> {
    names.iter().map(|r| r.to_string()).collect()
}

pub fn regional(resource_type: &'static str, display_name: &'static str) -> ScannerDescriptor {
    ScannerDescriptor {
        resource_type,
        display_name,
        is_global: false,
        columns: &["ID"],
    }
}

pub fn global(resource_type: &'static str, display_name: &'static str) -> ScannerDescriptor {
    ScannerDescriptor {
        is_global: true,
        ..regional(resource_type, display_name)
    }
}

/// `count` records with ids `<account>/<region>/<n>`
pub fn records(count: usize, account_id: &str, region: &str) -> Vec<ResourceRecord> {
    (0..count)
        .map(|n| {
            ResourceRecord::new()
                .field("ID", format!("{}/{}/{}", account_id, region, n))
                .field("Account ID", account_id)
                .field("Region", region)
        })
        .collect()
}

pub fn record_ids(records: &[ResourceRecord]) -> Vec<String> {
    records.iter().map(|r| r.display_value("ID")).collect()
}

/// Credential delegator with per-account outcomes
pub struct FakeDelegator {
    fail_identity: bool,
    denied: BTreeSet<String>,
    expire_first: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeDelegator {
    pub fn new() -> Self {
        Self {
            fail_identity: false,
            denied: BTreeSet::new(),
            expire_first: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn deny(mut self, account_id: &str) -> Self {
        self.denied.insert(account_id.to_string());
        self
    }

    pub fn fail_identity(mut self) -> Self {
        self.fail_identity = true;
        self
    }

    /// First credentials issued per account are already expired
    pub fn expire_first(mut self) -> Self {
        self.expire_first = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_for(&self, account_id: &str) -> usize {
        self.calls().iter().filter(|id| *id == account_id).count()
    }
}

#[async_trait]
impl CredentialDelegator for FakeDelegator {
    async fn verify_identity(&self) -> InventoryResult<CallerIdentity> {
        if self.fail_identity {
            return Err(InventoryError::IdentityVerification {
                message: "ExpiredToken: the security token included in the request is expired"
                    .to_string(),
            });
        }
        Ok(CallerIdentity {
            account: "999999999999".to_string(),
            arn: "arn:aws:iam::999999999999:user/inventory".to_string(),
        })
    }

    async fn obtain(&self, account_id: &str) -> DelegationResult<Credentials> {
        let issued = {
            let mut calls = self.calls.lock().expect("calls lock");
            calls.push(account_id.to_string());
            calls.iter().filter(|id| *id == account_id).count()
        };
        if self.denied.contains(account_id) {
            return Err(DelegationError::AccessDenied {
                account_id: account_id.to_string(),
                message: "not authorized to perform sts:AssumeRole".to_string(),
            });
        }
        let expires_at = if self.expire_first && issued == 1 {
            Utc::now() - chrono::Duration::minutes(5)
        } else {
            Utc::now() + chrono::Duration::hours(1)
        };
        Credentials::new(
            format!("AKIA{}N{}", account_id, issued),
            "secret",
            "token",
            expires_at,
        )
    }
}

pub struct FakeDirectory {
    accounts: Vec<Account>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryService for FakeDirectory {
    async fn list_accounts(&self) -> InventoryResult<Vec<Account>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(InventoryError::DirectoryUnavailable {
                message: "AWSOrganizationsNotInUseException".to_string(),
            });
        }
        Ok(self.accounts.clone())
    }
}

/// Tracks how many invocations are in flight at once
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub type Script = Arc<dyn Fn(&str, &str) -> ScannerResult<Vec<ResourceRecord>> + Send + Sync>;

/// One recorded scanner call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub account_id: String,
    pub region: String,
    pub access_key: String,
}

/// Scanner whose results come from a closure over `(account_id, region)`
pub struct ScriptedScanner {
    descriptor: ScannerDescriptor,
    script: Script,
    delays: BTreeMap<String, Duration>,
    gauge: Option<Arc<Gauge>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedScanner {
    pub fn new<F>(descriptor: ScannerDescriptor, script: F) -> Self
    where
        F: Fn(&str, &str) -> ScannerResult<Vec<ResourceRecord>> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            script: Arc::new(script),
            delays: BTreeMap::new(),
            gauge: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Returns `count` records for every account and region
    pub fn returning(descriptor: ScannerDescriptor, count: usize) -> Self {
        Self::new(descriptor, move |account, region| {
            Ok(records(count, account, region))
        })
    }

    /// Sleep before answering in `region`
    pub fn with_delay(mut self, region: &str, delay: Duration) -> Self {
        self.delays.insert(region.to_string(), delay);
        self
    }

    /// Sleep before answering in every listed region
    pub fn with_delays(mut self, regions: &[String], delay: Duration) -> Self {
        for region in regions {
            self.delays.insert(region.clone(), delay);
        }
        self
    }

    pub fn with_gauge(mut self, gauge: Arc<Gauge>) -> Self {
        self.gauge = Some(gauge);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().expect("invocations lock").clone()
    }
}

#[async_trait]
impl Scanner for ScriptedScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        self.descriptor
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        _account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        self.invocations
            .lock()
            .expect("invocations lock")
            .push(Invocation {
                account_id: account_id.to_string(),
                region: region.to_string(),
                access_key: credentials.access_key().to_string(),
            });
        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }
        if let Some(delay) = self.delays.get(region) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        if let Some(gauge) = &self.gauge {
            gauge.exit();
        }
        (self.script)(account_id, region)
    }
}

pub fn registry(scanners: &[Arc<ScriptedScanner>]) -> Arc<ScannerRegistry> {
    let scanners: Vec<Arc<dyn Scanner>> = scanners
        .iter()
        .map(|s| s.clone() as Arc<dyn Scanner>)
        .collect();
    Arc::new(ScannerRegistry::from_scanners(scanners).expect("distinct scanners"))
}

pub fn orchestrator(
    delegator: &Arc<FakeDelegator>,
    directory: &Arc<FakeDirectory>,
    scanners: &[Arc<ScriptedScanner>],
    settings: ScanSettings,
) -> ScanOrchestrator {
    ScanOrchestrator::new(
        delegator.clone(),
        directory.clone(),
        registry(scanners),
        settings,
    )
}
