//! End-to-end sweeps against in-memory delegator, directory and scanners

mod common;

use common::*;
use org_inventory::inventory::api::{
    FailureScope, InventoryError, ProgressObserver, ScanSettings,
};
use org_inventory::scanner::api::ScannerError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

fn settings(regions_: &[&str], max_concurrency: usize) -> ScanSettings {
    ScanSettings::new(regions(regions_), max_concurrency).expect("valid settings")
}

fn quiet_shutdown() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
    broadcast::channel(1)
}

#[derive(Default)]
struct CountingProgress {
    resolved: Mutex<Option<(usize, usize)>>,
    planned: AtomicUsize,
    finished_units: AtomicUsize,
    finished: AtomicUsize,
}

impl ProgressObserver for CountingProgress {
    fn accounts_resolved(&self, allowed: usize, excluded: usize) {
        *self.resolved.lock().expect("resolved lock") = Some((allowed, excluded));
    }

    fn units_planned(&self, total: usize) {
        self.planned.store(total, Ordering::SeqCst);
    }

    fn unit_finished(&self, _completed: usize, _total: usize) {
        self.finished_units.fetch_add(1, Ordering::SeqCst);
    }

    fn finished(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_denied_account_is_skipped_and_global_scanner_runs_once() {
    let delegator = Arc::new(FakeDelegator::new().deny(ACCOUNT_B));
    let directory = Arc::new(FakeDirectory::new(accounts(&[
        ACCOUNT_A, ACCOUNT_B, ACCOUNT_C,
    ])));
    let instances = Arc::new(ScriptedScanner::returning(
        regional("ec2_instance", "EC2 Instance"),
        2,
    ));
    let buckets = Arc::new(ScriptedScanner::returning(
        global("s3_bucket", "S3 Bucket"),
        1,
    ));
    let progress = Arc::new(CountingProgress::default());

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances.clone(), buckets.clone()],
        settings(&[R1, R2], 4),
    )
    .with_progress(progress.clone())
    .run(rx)
    .await
    .expect("sweep succeeds");

    // 2 accounts x (2 regional + 1 global)
    assert_eq!(report.units_planned(), 6);
    assert_eq!(report.units_completed(), 6);
    assert_eq!(report.accounts_total(), 3);
    assert_eq!(report.accounts_scanned(), 2);
    assert!(!report.interrupted());

    assert_eq!(report.failures().len(), 1);
    let failure = &report.failures()[0];
    assert_eq!(failure.scope, FailureScope::Account);
    assert_eq!(failure.account_id, ACCOUNT_B);
    assert!(failure.message.contains("sts:AssumeRole"));

    assert_eq!(report.count_for("ec2_instance"), 8);
    assert_eq!(report.count_for("s3_bucket"), 2);
    assert_eq!(report.total_resources(), 10);

    let bucket_regions: Vec<String> = buckets
        .invocations()
        .into_iter()
        .map(|i| i.region)
        .collect();
    assert_eq!(bucket_regions, vec![R1.to_string(), R1.to_string()]);
    assert!(instances
        .invocations()
        .iter()
        .all(|i| i.account_id != ACCOUNT_B));

    assert_eq!(*progress.resolved.lock().expect("resolved lock"), Some((3, 0)));
    assert_eq!(progress.planned.load(Ordering::SeqCst), 6);
    assert_eq!(progress.finished_units.load(Ordering::SeqCst), 6);
    assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_region_failure_keeps_other_region_records() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A])));
    let instances = Arc::new(ScriptedScanner::new(
        regional("ec2_instance", "EC2 Instance"),
        |account, region| {
            if region == R2 {
                Err(ScannerError::from_code(Some("Throttling"), "Rate exceeded"))
            } else {
                Ok(records(5, account, region))
            }
        },
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(&delegator, &directory, &[instances], settings(&[R1, R2], 2))
        .run(rx)
        .await
        .expect("sweep succeeds");

    assert_eq!(report.count_for("ec2_instance"), 5);
    assert!(record_ids(report.records_for("ec2_instance"))
        .iter()
        .all(|id| id.contains(R1)));
    assert_eq!(report.failures().len(), 1);
    let failure = &report.failures()[0];
    assert_eq!(failure.scope, FailureScope::AccountRegionScanner);
    assert!(failure.identity.contains(R2));
    assert_eq!(failure.message, "Throttling: Rate exceeded");
    assert_eq!(report.accounts_scanned(), 1);
}

#[tokio::test]
async fn test_one_failing_unit_does_not_disturb_the_rest() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A, ACCOUNT_C])));
    let instances = Arc::new(ScriptedScanner::new(
        regional("ec2_instance", "EC2 Instance"),
        |account, region| {
            if account == ACCOUNT_C && region == R2 {
                Err(ScannerError::AccessDenied {
                    message: "UnauthorizedOperation".to_string(),
                })
            } else {
                Ok(records(1, account, region))
            }
        },
    ));
    let volumes = Arc::new(ScriptedScanner::returning(
        regional("ebs_volume", "EBS Volume"),
        1,
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances, volumes],
        settings(&[R1, R2], 3),
    )
    .run(rx)
    .await
    .expect("sweep succeeds");

    assert_eq!(report.units_planned(), 8);
    assert_eq!(report.units_completed(), 8);
    assert_eq!(report.total_resources(), 7);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].account_id, ACCOUNT_C);
    assert!(report.failures()[0].identity.starts_with("EC2 Instance"));
}

#[tokio::test]
async fn test_region_unavailable_widens_failure_scope() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A])));
    let instances = Arc::new(ScriptedScanner::new(
        regional("ec2_instance", "EC2 Instance"),
        |account, region| {
            if region == R2 {
                Err(ScannerError::from_code(Some("OptInRequired"), "region disabled"))
            } else {
                Ok(records(1, account, region))
            }
        },
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(&delegator, &directory, &[instances], settings(&[R1, R2], 2))
        .run(rx)
        .await
        .expect("sweep succeeds");

    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].scope, FailureScope::AccountRegion);
}

#[tokio::test]
async fn test_excluded_accounts_are_never_touched() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[
        ACCOUNT_A, ACCOUNT_B, ACCOUNT_C,
    ])));
    let instances = Arc::new(ScriptedScanner::returning(
        regional("ec2_instance", "EC2 Instance"),
        1,
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances.clone()],
        settings(&[R1], 2).with_excluded_accounts([ACCOUNT_B]),
    )
    .run(rx)
    .await
    .expect("sweep succeeds");

    assert_eq!(delegator.calls_for(ACCOUNT_B), 0);
    assert!(instances
        .invocations()
        .iter()
        .all(|i| i.account_id != ACCOUNT_B));
    assert!(report.failures().is_empty());
    assert_eq!(report.accounts_total(), 3);
    assert_eq!(report.accounts_excluded(), 1);
    assert_eq!(report.accounts_scanned(), 2);
    assert_eq!(report.count_for("ec2_instance"), 2);
}

#[tokio::test]
async fn test_directory_failure_stops_before_any_delegation() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::unreachable());
    let instances = Arc::new(ScriptedScanner::returning(
        regional("ec2_instance", "EC2 Instance"),
        1,
    ));

    let (_tx, rx) = quiet_shutdown();
    let result = orchestrator(&delegator, &directory, &[instances.clone()], settings(&[R1], 2))
        .run(rx)
        .await;

    assert!(matches!(
        result,
        Err(InventoryError::DirectoryUnavailable { .. })
    ));
    assert!(delegator.calls().is_empty());
    assert!(instances.invocations().is_empty());
}

#[tokio::test]
async fn test_identity_failure_stops_before_directory() {
    let delegator = Arc::new(FakeDelegator::new().fail_identity());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A])));
    let instances = Arc::new(ScriptedScanner::returning(
        regional("ec2_instance", "EC2 Instance"),
        1,
    ));

    let (_tx, rx) = quiet_shutdown();
    let result = orchestrator(&delegator, &directory, &[instances.clone()], settings(&[R1], 2))
        .run(rx)
        .await;

    match result {
        Err(InventoryError::IdentityVerification { message }) => {
            assert!(message.contains("ExpiredToken"));
        }
        other => panic!("expected identity failure, got {:?}", other.map(|_| ())),
    }
    assert_eq!(directory.calls(), 0);
    assert!(delegator.calls().is_empty());
    assert!(instances.invocations().is_empty());
}

#[tokio::test]
async fn test_concurrency_never_exceeds_ceiling() {
    let region_list = regions(&[R1, R2]);
    let gauge = Arc::new(Gauge::default());
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[
        ACCOUNT_A, ACCOUNT_B, ACCOUNT_C,
    ])));
    let instances = Arc::new(
        ScriptedScanner::returning(regional("ec2_instance", "EC2 Instance"), 1)
            .with_delays(&region_list, Duration::from_millis(20))
            .with_gauge(gauge.clone()),
    );
    let volumes = Arc::new(
        ScriptedScanner::returning(regional("ebs_volume", "EBS Volume"), 1)
            .with_delays(&region_list, Duration::from_millis(20))
            .with_gauge(gauge.clone()),
    );

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances, volumes],
        settings(&[R1, R2], 3),
    )
    .run(rx)
    .await
    .expect("sweep succeeds");

    assert_eq!(report.units_completed(), 12);
    assert!(gauge.peak() <= 3, "peak concurrency was {}", gauge.peak());
    assert!(gauge.peak() >= 2, "units never overlapped");
}

#[tokio::test]
async fn test_slow_unit_times_out() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A])));
    let instances = Arc::new(
        ScriptedScanner::returning(regional("ec2_instance", "EC2 Instance"), 3)
            .with_delay(R2, Duration::from_secs(30)),
    );

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances],
        settings(&[R1, R2], 2).with_unit_timeout(Some(Duration::from_millis(50))),
    )
    .run(rx)
    .await
    .expect("sweep succeeds");

    assert_eq!(report.count_for("ec2_instance"), 3);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].message, "timed out after 50ms");
    assert!(!report.interrupted());
}

#[tokio::test]
async fn test_panicking_scanner_becomes_a_failure() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A])));
    let instances = Arc::new(ScriptedScanner::new(
        regional("ec2_instance", "EC2 Instance"),
        |account, region| {
            if region == R1 {
                panic!("kaboom");
            }
            Ok(records(2, account, region))
        },
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(&delegator, &directory, &[instances], settings(&[R1, R2], 2))
        .run(rx)
        .await
        .expect("sweep succeeds");

    assert_eq!(report.units_completed(), 2);
    assert_eq!(report.count_for("ec2_instance"), 2);
    assert_eq!(report.failures().len(), 1);
    assert_eq!(
        report.failures()[0].message,
        "scanner failed unexpectedly: kaboom"
    );
}

#[tokio::test]
async fn test_interrupt_returns_partial_report() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A, ACCOUNT_C])));
    let instances = Arc::new(
        ScriptedScanner::returning(regional("ec2_instance", "EC2 Instance"), 1)
            .with_delay(R2, Duration::from_secs(60)),
    );

    let (tx, rx) = quiet_shutdown();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(());
    });

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator(&delegator, &directory, &[instances], settings(&[R1, R2], 4)).run(rx),
    )
    .await
    .expect("interrupt ends the sweep promptly")
    .expect("partial report");

    assert!(report.interrupted());
    assert_eq!(report.units_planned(), 4);
    assert_eq!(report.units_completed(), 2);
    assert_eq!(report.count_for("ec2_instance"), 2);
    assert!(record_ids(report.records_for("ec2_instance"))
        .iter()
        .all(|id| id.contains(R1)));
}

#[tokio::test]
async fn test_expired_credentials_are_refreshed_once_per_account() {
    let delegator = Arc::new(FakeDelegator::new().expire_first());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A])));
    let instances = Arc::new(ScriptedScanner::returning(
        regional("ec2_instance", "EC2 Instance"),
        1,
    ));
    let volumes = Arc::new(ScriptedScanner::returning(
        regional("ebs_volume", "EBS Volume"),
        1,
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances.clone(), volumes.clone()],
        settings(&[R1, R2], 4),
    )
    .run(rx)
    .await
    .expect("sweep succeeds");

    assert!(report.failures().is_empty());
    assert_eq!(delegator.calls_for(ACCOUNT_A), 2);
    let refreshed = format!("AKIA{}N2", ACCOUNT_A);
    for invocation in instances.invocations().iter().chain(volumes.invocations().iter()) {
        assert_eq!(invocation.access_key, refreshed);
    }
}

#[tokio::test]
async fn test_record_order_is_independent_of_concurrency() {
    async fn sweep(max_concurrency: usize) -> Vec<String> {
        let delegator = Arc::new(FakeDelegator::new());
        let directory = Arc::new(FakeDirectory::new(accounts(&[
            ACCOUNT_A, ACCOUNT_B, ACCOUNT_C,
        ])));
        let instances = Arc::new(
            ScriptedScanner::returning(regional("ec2_instance", "EC2 Instance"), 2)
                .with_delay(R1, Duration::from_millis(30))
                .with_delay(R2, Duration::from_millis(5)),
        );
        let (_tx, rx) = quiet_shutdown();
        let report = orchestrator(
            &delegator,
            &directory,
            &[instances],
            settings(&[R1, R2], max_concurrency),
        )
        .run(rx)
        .await
        .expect("sweep succeeds");
        record_ids(report.records_for("ec2_instance"))
    }

    let serial = sweep(1).await;
    let parallel = sweep(8).await;
    assert_eq!(serial.len(), 12);
    assert_eq!(serial, parallel);
}

#[tokio::test]
async fn test_repeated_regions_are_scanned_once() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A])));
    let instances = Arc::new(ScriptedScanner::returning(
        regional("ec2_instance", "EC2 Instance"),
        2,
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances.clone()],
        settings(&[R1, R2, R1], 2),
    )
    .run(rx)
    .await
    .expect("sweep succeeds");

    assert_eq!(report.units_planned(), 2);
    assert_eq!(report.units_completed(), 2);
    assert_eq!(report.count_for("ec2_instance"), 4);
    assert!(report.failures().is_empty());
    assert_eq!(instances.invocations().len(), 2);
}

#[tokio::test]
async fn test_account_with_every_unit_failed_still_counts_as_scanned() {
    let delegator = Arc::new(FakeDelegator::new());
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A, ACCOUNT_C])));
    let failing_in_c = |account: &str, region: &str| {
        if account == ACCOUNT_C {
            Err(ScannerError::AccessDenied {
                message: "UnauthorizedOperation".to_string(),
            })
        } else {
            Ok(records(1, account, region))
        }
    };
    let instances = Arc::new(ScriptedScanner::new(
        regional("ec2_instance", "EC2 Instance"),
        failing_in_c,
    ));
    let buckets = Arc::new(ScriptedScanner::new(
        global("s3_bucket", "S3 Bucket"),
        failing_in_c,
    ));

    let (_tx, rx) = quiet_shutdown();
    let report = orchestrator(
        &delegator,
        &directory,
        &[instances, buckets],
        settings(&[R1, R2], 4),
    )
    .run(rx)
    .await
    .expect("sweep succeeds");

    assert_eq!(report.accounts_scanned(), 2);
    let c_failures: Vec<_> = report
        .failures()
        .iter()
        .filter(|f| f.account_id == ACCOUNT_C)
        .collect();
    // two regional units plus one global unit
    assert_eq!(c_failures.len(), 3);
    assert!(c_failures
        .iter()
        .all(|f| f.scope == FailureScope::AccountRegionScanner));
    assert_eq!(report.failures().len(), 3);
    assert_eq!(report.total_resources(), 3);
}
