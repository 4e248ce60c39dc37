//! Shared SDK configuration
//!
//! The management account configuration is loaded once. Each work unit gets
//! a derived configuration carrying its delegated credentials and region.

use crate::inventory::types::Credentials;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use std::time::SystemTime;

/// Provider name reported by derived credentials
const PROVIDER_NAME: &str = "org-inventory";

#[derive(Clone, Debug)]
pub struct AwsContext {
    base: SdkConfig,
}

impl AwsContext {
    /// Load the default credential and region chain
    ///
    /// `fallback_region` is used only when neither the environment nor the
    /// shared profile names a region.
    pub async fn load(fallback_region: &str) -> Self {
        let region = aws_config::meta::region::RegionProviderChain::default_provider()
            .or_else(Region::new(fallback_region.to_string()));
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        log::debug!(
            "Loaded SDK configuration (region {})",
            base.region().map(|r| r.as_ref()).unwrap_or("unset")
        );
        Self { base }
    }

    pub fn from_config(base: SdkConfig) -> Self {
        Self { base }
    }

    /// Configuration with no credentials, for building clients that are never called
    pub fn offline() -> Self {
        Self {
            base: SdkConfig::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .build(),
        }
    }

    pub fn base(&self) -> &SdkConfig {
        &self.base
    }

    /// Configuration scoped to one account and region
    pub fn config_for(&self, credentials: &Credentials, region: &str) -> SdkConfig {
        let provider = aws_credential_types::Credentials::new(
            credentials.access_key(),
            credentials.secret_key(),
            Some(credentials.session_token().to_string()),
            Some(SystemTime::from(credentials.expires_at())),
            PROVIDER_NAME,
        );
        self.base
            .to_builder()
            .credentials_provider(SharedCredentialsProvider::new(provider))
            .region(Region::new(region.to_string()))
            .build()
    }
}
