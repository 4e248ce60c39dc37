//! Report writer trait and export formats

use crate::inventory::api::AggregatedReport;
use crate::report::error::ReportResult;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Artifact formats a sweep can be written as
#[derive(EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportFormat {
    /// Directory of CSV sheets, one per resource type plus summary and errors
    Csv,
    /// Single JSON document
    Json,
}

impl ExportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn mimetype(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    pub fn formats() -> impl Iterator<Item = ExportFormat> {
        ExportFormat::iter()
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        ExportFormat::iter().map(|fmt| fmt.name())
    }

    /// Parse a format name, case-insensitively
    pub fn from_str(s: &str) -> Option<Self> {
        let lowercase = s.trim().to_lowercase();
        Self::iter().find(|fmt| fmt.name() == lowercase)
    }

    /// Format named by the extension of `path`
    pub fn for_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_str)
    }

    pub fn writer(&self) -> Box<dyn ReportWriter> {
        match self {
            Self::Csv => Box::new(crate::report::csv::CsvWorkbookWriter::new()),
            Self::Json => Box::new(crate::report::json::JsonReportWriter::new()),
        }
    }
}

/// Writes a finalized report below an output directory
pub trait ReportWriter {
    fn format(&self) -> ExportFormat;

    /// Write all artifacts and return the files created
    fn write(&self, report: &AggregatedReport, output_dir: &Path) -> ReportResult<Vec<PathBuf>>;
}

/// `inventory-<timestamp>` stem shared by every artifact of one sweep
pub fn artifact_stem(report: &AggregatedReport) -> String {
    format!("inventory-{}", report.started_at().format("%Y-%m-%d_%H-%M-%S"))
}
