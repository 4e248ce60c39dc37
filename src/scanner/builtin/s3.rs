//! S3 bucket scanner (global)
//!
//! Buckets are listed once per account. Location, versioning and tags are
//! looked up per bucket against the bucket's own region; any of those may
//! fail without dropping the bucket.

use super::{service_error, tolerate};
use crate::aws::context::AwsContext;
use crate::inventory::types::Credentials;
use crate::scanner::error::ScannerResult;
use crate::scanner::fields::{format_sdk_time, format_tags, NOT_AVAILABLE};
use crate::scanner::record::ResourceRecord;
use crate::scanner::traits::{Scanner, ScannerDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

pub const BUCKET: ScannerDescriptor = ScannerDescriptor {
    resource_type: "s3_bucket",
    display_name: "S3 Bucket",
    is_global: true,
    columns: &[
        "Bucket Name",
        "Account ID",
        "Account Name",
        "Region",
        "ARN",
        "Creation Date",
        "Versioning",
        "Tags",
    ],
};

/// Region reported by GetBucketLocation; empty means us-east-1, `EU` is the legacy eu-west-1
pub(crate) fn normalize_location(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => "us-east-1".to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

pub struct BucketScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for BucketScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        BUCKET
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let s3 = aws_sdk_s3::Client::new(&self.context.config_for(credentials, region));
        let output = s3.list_buckets().send().await.map_err(service_error)?;

        let mut regional: HashMap<String, aws_sdk_s3::Client> = HashMap::new();
        let mut records = Vec::new();

        for bucket in output.buckets() {
            let Some(name) = bucket.name() else {
                continue;
            };

            let location = tolerate(
                s3.get_bucket_location().bucket(name).send().await,
                "location",
                name,
            );
            let bucket_region = normalize_location(
                location
                    .as_ref()
                    .and_then(|l| l.location_constraint())
                    .map(|c| c.as_str()),
            );

            let client = regional
                .entry(bucket_region.clone())
                .or_insert_with(|| {
                    aws_sdk_s3::Client::new(&self.context.config_for(credentials, &bucket_region))
                })
                .clone();

            let versioning = tolerate(
                client.get_bucket_versioning().bucket(name).send().await,
                "versioning",
                name,
            )
            .and_then(|v| v.status().map(|s| s.as_str().to_string()))
            .unwrap_or_else(|| "Disabled".to_string());

            // NoSuchTagSet is the normal answer for untagged buckets
            let tags = tolerate(
                client.get_bucket_tagging().bucket(name).send().await,
                "tags",
                name,
            )
            .map(|t| format_tags(t.tag_set().iter().map(|tag| (tag.key(), tag.value()))))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            records.push(
                ResourceRecord::new()
                    .field("Bucket Name", name)
                    .field("Account ID", account_id)
                    .field("Account Name", account_name)
                    .field("Region", bucket_region.as_str())
                    .field("ARN", format!("arn:aws:s3:::{}", name))
                    .field("Creation Date", format_sdk_time(bucket.creation_date()))
                    .field("Versioning", versioning)
                    .field("Tags", tags),
            );
        }

        log::debug!(
            "{} buckets in {} across {} regions",
            records.len(),
            account_id,
            regional.len()
        );
        Ok(records)
    }
}

fn build(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(BucketScanner {
        context: context.clone(),
    })
}

crate::builtin_scanner!(build);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location(None), "us-east-1");
        assert_eq!(normalize_location(Some("")), "us-east-1");
        assert_eq!(normalize_location(Some("EU")), "eu-west-1");
        assert_eq!(normalize_location(Some("ap-south-1")), "ap-south-1");
    }

    #[test]
    fn test_descriptor_is_global() {
        assert!(BUCKET.is_global);
        assert_eq!(BUCKET.sheet_name(), "S3_Bucket");
    }
}
