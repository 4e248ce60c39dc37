//! Report API

pub use crate::report::csv::CsvWorkbookWriter;
pub use crate::report::error::{ReportError, ReportResult};
pub use crate::report::json::JsonReportWriter;
pub use crate::report::summary::{format_elapsed, SummaryPrinter, DEFAULT_ERROR_DISPLAY_LIMIT};
pub use crate::report::traits::{artifact_stem, ExportFormat, ReportWriter};
pub use crate::report::upload::{S3Uploader, UploadSummary};
