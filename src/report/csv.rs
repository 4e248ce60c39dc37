//! CSV workbook writer
//!
//! A sweep becomes a directory: `summary.csv`, one sheet per resource type
//! that produced records, and `errors.csv`.

use crate::inventory::api::AggregatedReport;
use crate::report::error::{ReportError, ReportResult};
use crate::report::traits::{artifact_stem, ExportFormat, ReportWriter};
use crate::scanner::api::{ResourceRecord, ScannerDescriptor};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.csv";
pub const ERRORS_FILE: &str = "errors.csv";
const NO_ERRORS: &str = "All accounts and regions scanned successfully!";

#[derive(Debug, Default)]
pub struct CsvWorkbookWriter {
    delimiter: char,
}

impl CsvWorkbookWriter {
    pub fn new() -> Self {
        Self { delimiter: ',' }
    }

    /// Quote a value if it contains the delimiter, a quote or a line break
    fn escape(&self, value: &str) -> String {
        if value.contains(self.delimiter)
            || value.contains('"')
            || value.contains('\n')
            || value.contains('\r')
        {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }

    fn push_row<S: AsRef<str>>(&self, out: &mut String, values: &[S]) {
        let escaped: Vec<String> = values.iter().map(|v| self.escape(v.as_ref())).collect();
        out.push_str(&escaped.join(&self.delimiter.to_string()));
        out.push('\n');
    }

    pub fn render_summary(&self, report: &AggregatedReport) -> String {
        let mut out = String::new();
        let generated = report.finished_at().format("%Y-%m-%d %H:%M:%S").to_string();
        let accounts = report.accounts_scanned().to_string();
        let regions = report.regions_scanned().to_string();
        let total = report.total_resources().to_string();

        self.push_row(&mut out, &["Resource Type", "Sheet Name", "Count", "Global"]);
        self.push_row(&mut out, &["SCAN SUMMARY", "", "", ""]);
        self.push_row(&mut out, &["Generated At", generated.as_str(), "", ""]);
        self.push_row(&mut out, &["Accounts Scanned", accounts.as_str(), "", ""]);
        self.push_row(&mut out, &["Regions Scanned", regions.as_str(), "", ""]);
        self.push_row(&mut out, &["Total Resources", total.as_str(), "", ""]);
        if report.interrupted() {
            self.push_row(&mut out, &["Interrupted", "Yes", "", ""]);
        }
        self.push_row(&mut out, &["", "", "", ""]);
        self.push_row(&mut out, &["RESOURCE COUNTS", "", "", ""]);

        for (descriptor, count) in report.counts_descending() {
            let global = if descriptor.is_global { "Yes" } else { "No" };
            self.push_row(
                &mut out,
                &[
                    descriptor.display_name.to_string(),
                    descriptor.sheet_name(),
                    count.to_string(),
                    global.to_string(),
                ],
            );
        }
        out
    }

    /// Descriptor columns first, then any other fields alphabetically
    fn columns(descriptor: &ScannerDescriptor, records: &[ResourceRecord]) -> Vec<String> {
        let known: BTreeSet<&str> = descriptor.columns.iter().copied().collect();
        let extra: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.field_names())
            .filter(|name| !known.contains(name))
            .collect();
        descriptor
            .columns
            .iter()
            .copied()
            .chain(extra)
            .map(str::to_string)
            .collect()
    }

    pub fn render_sheet(&self, descriptor: &ScannerDescriptor, records: &[ResourceRecord]) -> String {
        let mut out = String::new();
        let columns = Self::columns(descriptor, records);
        self.push_row(&mut out, &columns);
        for record in records {
            let values: Vec<String> = columns.iter().map(|c| record.display_value(c)).collect();
            self.push_row(&mut out, &values);
        }
        out
    }

    pub fn render_errors(&self, report: &AggregatedReport) -> String {
        let mut out = String::new();
        if report.failures().is_empty() {
            self.push_row(&mut out, &["Status"]);
            self.push_row(&mut out, &[NO_ERRORS]);
            return out;
        }
        self.push_row(&mut out, &["Scope", "Account ID", "Error/Skipped"]);
        for failure in report.failures() {
            self.push_row(
                &mut out,
                &[
                    failure.scope.as_str().to_string(),
                    failure.account_id.clone(),
                    failure.to_string(),
                ],
            );
        }
        out
    }
}

fn write_file(path: PathBuf, contents: &str) -> ReportResult<PathBuf> {
    fs::write(&path, contents).map_err(|e| ReportError::io("write report file", &path, e))?;
    log::debug!("Wrote {}", path.display());
    Ok(path)
}

impl ReportWriter for CsvWorkbookWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write(&self, report: &AggregatedReport, output_dir: &Path) -> ReportResult<Vec<PathBuf>> {
        let dir = output_dir.join(artifact_stem(report));
        fs::create_dir_all(&dir).map_err(|e| ReportError::io("create report directory", &dir, e))?;

        let mut written = vec![write_file(dir.join(SUMMARY_FILE), &self.render_summary(report))?];
        for descriptor in report.scanners() {
            let records = report.records_for(descriptor.resource_type);
            if records.is_empty() {
                continue;
            }
            let path = dir.join(format!("{}.csv", descriptor.sheet_name()));
            written.push(write_file(path, &self.render_sheet(descriptor, records))?);
        }
        written.push(write_file(dir.join(ERRORS_FILE), &self.render_errors(report))?);

        log::info!("CSV report written to {}", dir.display());
        Ok(written)
    }
}
