//! JSON report writer

use crate::inventory::api::AggregatedReport;
use crate::report::error::{ReportError, ReportResult};
use crate::report::traits::{artifact_stem, ExportFormat, ReportWriter};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the whole report as one pretty-printed document
#[derive(Debug, Default)]
pub struct JsonReportWriter;

impl JsonReportWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, report: &AggregatedReport) -> ReportResult<String> {
        serde_json::to_string_pretty(report).map_err(|e| ReportError::Serialization {
            message: e.to_string(),
        })
    }
}

impl ReportWriter for JsonReportWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn write(&self, report: &AggregatedReport, output_dir: &Path) -> ReportResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)
            .map_err(|e| ReportError::io("create output directory", output_dir, e))?;
        let path = output_dir.join(format!("{}.json", artifact_stem(report)));
        let document = self.render(report)?;
        fs::write(&path, document).map_err(|e| ReportError::io("write report file", &path, e))?;
        log::info!("JSON report written to {}", path.display());
        Ok(vec![path])
    }
}
