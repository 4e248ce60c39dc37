//! Sweep results rendered through every export format

mod common;

use common::*;
use org_inventory::inventory::api::{AggregatedReport, ScanSettings};
use org_inventory::report::api::{artifact_stem, ExportFormat, SummaryPrinter};
use org_inventory::scanner::api::ScannerError;
use std::fs;
use std::sync::Arc;
use tokio::sync::broadcast;

async fn sweep() -> AggregatedReport {
    let delegator = Arc::new(FakeDelegator::new().deny(ACCOUNT_B));
    let directory = Arc::new(FakeDirectory::new(accounts(&[ACCOUNT_A, ACCOUNT_B])));
    let instances = Arc::new(ScriptedScanner::new(
        regional("ec2_instance", "EC2 Instance"),
        |account, region| {
            if region == R2 {
                Err(ScannerError::from_code(Some("Throttling"), "Rate exceeded"))
            } else {
                Ok(records(3, account, region))
            }
        },
    ));
    let buckets = Arc::new(ScriptedScanner::returning(
        global("s3_bucket", "S3 Bucket"),
        0,
    ));
    let settings = ScanSettings::new(regions(&[R1, R2]), 4).expect("valid settings");

    let (_tx, rx) = broadcast::channel(1);
    orchestrator(&delegator, &directory, &[instances, buckets], settings)
        .run(rx)
        .await
        .expect("sweep succeeds")
}

#[tokio::test]
async fn test_csv_workbook_from_sweep() {
    let report = sweep().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let written = ExportFormat::Csv
        .writer()
        .write(&report, dir.path())
        .expect("write csv");

    let workbook = dir.path().join(artifact_stem(&report));
    let names: Vec<String> = written
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    // the empty bucket sheet is skipped
    assert_eq!(names, vec!["summary.csv", "EC2_Instance.csv", "errors.csv"]);
    assert!(written.iter().all(|p| p.starts_with(&workbook)));

    let sheet = fs::read_to_string(workbook.join("EC2_Instance.csv")).expect("sheet");
    let mut lines = sheet.lines();
    assert!(lines.next().is_some_and(|header| header.starts_with("ID")));
    assert_eq!(lines.count(), 3);

    let errors = fs::read_to_string(workbook.join("errors.csv")).expect("errors");
    assert!(errors.contains(ACCOUNT_B));
    assert!(errors.contains("Throttling: Rate exceeded"));

    let summary = fs::read_to_string(workbook.join("summary.csv")).expect("summary");
    assert!(summary.contains("Total Resources,3"));
}

#[tokio::test]
async fn test_json_document_from_sweep() {
    let report = sweep().await;
    let dir = tempfile::tempdir().expect("tempdir");

    let written = ExportFormat::Json
        .writer()
        .write(&report, dir.path())
        .expect("write json");
    assert_eq!(written.len(), 1);

    let document = fs::read_to_string(&written[0]).expect("json");
    let value: serde_json::Value = serde_json::from_str(&document).expect("valid json");
    assert_eq!(value["accounts_total"], 2);
    assert_eq!(value["accounts_scanned"], 1);
    assert_eq!(value["units_planned"], 3);
    assert_eq!(
        value["resources_by_scanner"]["s3_bucket"].as_array().map(Vec::len),
        Some(0)
    );
    assert_eq!(value["failures"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_console_summary_from_sweep() {
    let report = sweep().await;
    let rendered = SummaryPrinter::new(false, 1).render(&report);

    assert!(rendered.contains("Total Resources: 3"));
    assert!(rendered.contains("2 Errors/Skipped:"));
    assert!(rendered.contains("... and 1 more"));
}
