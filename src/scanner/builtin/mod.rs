//! Builtin scanners
//!
//! Each scanner registers itself with `builtin_scanner!` and builds its SDK
//! client per invocation from the delegated credentials.

pub mod ec2;
pub mod iam;
pub mod lambda;
pub mod s3;

use crate::scanner::error::ScannerError;
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};

/// Convert an SDK error into a classified scanner error
pub(crate) fn service_error<E>(err: E) -> ScannerError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    ScannerError::from_code(err.code(), DisplayErrorContext(&err).to_string())
}

/// Best-effort lookup used for per-resource details
///
/// The resource is still reported; the field falls back to its default.
pub(crate) fn tolerate<T, E>(result: Result<T, E>, what: &str, resource: &str) -> Option<T>
where
    E: std::error::Error + 'static,
{
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::debug!(
                "Could not read {} for {}: {}",
                what,
                resource,
                DisplayErrorContext(&err)
            );
            None
        }
    }
}
