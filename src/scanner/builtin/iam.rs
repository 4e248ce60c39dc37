//! IAM role scanner (global)

use super::{service_error, tolerate};
use crate::aws::context::AwsContext;
use crate::inventory::types::Credentials;
use crate::scanner::error::ScannerResult;
use crate::scanner::fields::{format_sdk_time, format_tags, or_na, NOT_AVAILABLE};
use crate::scanner::record::ResourceRecord;
use crate::scanner::traits::{Scanner, ScannerDescriptor};
use std::sync::Arc;

/// IAM's own default when a role does not state one
const DEFAULT_MAX_SESSION_DURATION: i32 = 3600;

pub const ROLE: ScannerDescriptor = ScannerDescriptor {
    resource_type: "iam_role",
    display_name: "IAM Role",
    is_global: true,
    columns: &[
        "Role Name",
        "Role ID",
        "Account ID",
        "Account Name",
        "Region",
        "ARN",
        "Path",
        "Created Date",
        "Max Session Duration",
        "Description",
        "Tags",
    ],
};

pub struct RoleScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for RoleScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        ROLE
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let iam = aws_sdk_iam::Client::new(&self.context.config_for(credentials, region));
        let mut pages = iam.list_roles().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(service_error)?;
            for role in page.roles() {
                let role_name = role.role_name();
                let tags = tolerate(
                    iam.list_role_tags().role_name(role_name).send().await,
                    "tags",
                    role_name,
                )
                .map(|t| format_tags(t.tags().iter().map(|tag| (tag.key(), tag.value()))))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

                records.push(
                    ResourceRecord::new()
                        .field("Role Name", role_name)
                        .field("Role ID", role.role_id())
                        .field("Account ID", account_id)
                        .field("Account Name", account_name)
                        .field("Region", "global")
                        .field("ARN", role.arn())
                        .field("Path", role.path())
                        .field("Created Date", format_sdk_time(Some(role.create_date())))
                        .field(
                            "Max Session Duration",
                            role.max_session_duration()
                                .unwrap_or(DEFAULT_MAX_SESSION_DURATION),
                        )
                        .field("Description", or_na(role.description()))
                        .field("Tags", tags),
                );
            }
        }

        Ok(records)
    }
}

fn build(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(RoleScanner {
        context: context.clone(),
    })
}

crate::builtin_scanner!(build);
