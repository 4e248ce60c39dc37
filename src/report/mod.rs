//! Report output
//!
//! Writers turn a finalized [`AggregatedReport`](crate::inventory::api::AggregatedReport)
//! into files below the output directory; the summary printer renders it for
//! the console and the uploader copies the written files to S3.

pub mod api;
pub mod csv;
pub mod error;
pub mod json;
pub mod summary;
pub mod traits;
pub mod upload;

pub use error::{ReportError, ReportResult};
pub use traits::{ExportFormat, ReportWriter};
