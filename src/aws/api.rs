//! AWS API
//!
//! Public surface of the AWS collaborators.

pub use crate::aws::context::AwsContext;
pub use crate::aws::organizations::OrganizationsDirectory;
pub use crate::aws::sts::{StsDelegator, DEFAULT_SESSION_DURATION};
