//! AWS SDK backed collaborators
//!
//! - [`context::AwsContext`] holds the management configuration and derives per-account configs
//! - [`sts::StsDelegator`] assumes the inventory role in member accounts
//! - [`organizations::OrganizationsDirectory`] lists member accounts

pub mod api;
pub mod context;
pub mod organizations;
pub mod sts;
