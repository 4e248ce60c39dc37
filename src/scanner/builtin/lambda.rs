//! Lambda function scanner

use super::{service_error, tolerate};
use crate::aws::context::AwsContext;
use crate::inventory::types::Credentials;
use crate::scanner::error::ScannerResult;
use crate::scanner::fields::{format_tags, or_na, value_or_na, NOT_AVAILABLE};
use crate::scanner::record::ResourceRecord;
use crate::scanner::traits::{Scanner, ScannerDescriptor};
use std::collections::HashMap;
use std::sync::Arc;

pub const FUNCTION: ScannerDescriptor = ScannerDescriptor {
    resource_type: "lambda_function",
    display_name: "Lambda Function",
    is_global: false,
    columns: &[
        "Function Name",
        "Function ARN",
        "Account ID",
        "Account Name",
        "Region",
        "Runtime",
        "Handler",
        "Memory (MB)",
        "Timeout (sec)",
        "Last Modified",
        "State",
        "Role ARN",
        "Tags",
    ],
};

// ListTags returns a map; sort so the rendered column is stable
fn sorted_tags(tags: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&str, &str)> = tags
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    pairs.sort();
    format_tags(pairs)
}

pub struct FunctionScanner {
    context: AwsContext,
}

#[async_trait::async_trait]
impl Scanner for FunctionScanner {
    fn descriptor(&self) -> ScannerDescriptor {
        FUNCTION
    }

    async fn invoke(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> ScannerResult<Vec<ResourceRecord>> {
        let lambda = aws_sdk_lambda::Client::new(&self.context.config_for(credentials, region));
        let mut pages = lambda.list_functions().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(service_error)?;
            for function in page.functions() {
                let Some(name) = function.function_name() else {
                    continue;
                };
                let tags = match function.function_arn() {
                    Some(function_arn) => tolerate(
                        lambda.list_tags().resource(function_arn).send().await,
                        "tags",
                        name,
                    )
                    .and_then(|t| t.tags().map(sorted_tags)),
                    None => None,
                }
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

                records.push(
                    ResourceRecord::new()
                        .field("Function Name", name)
                        .field("Function ARN", or_na(function.function_arn()))
                        .field("Account ID", account_id)
                        .field("Account Name", account_name)
                        .field("Region", region)
                        .field("Runtime", or_na(function.runtime().map(|r| r.as_str())))
                        .field("Handler", or_na(function.handler()))
                        .field("Memory (MB)", value_or_na(function.memory_size()))
                        .field("Timeout (sec)", value_or_na(function.timeout()))
                        .field("Last Modified", or_na(function.last_modified()))
                        .field(
                            "State",
                            function.state().map(|s| s.as_str()).unwrap_or("Active"),
                        )
                        .field("Role ARN", or_na(function.role()))
                        .field("Tags", tags),
                );
            }
        }

        Ok(records)
    }
}

fn build(context: &AwsContext) -> Arc<dyn Scanner> {
    Arc::new(FunctionScanner {
        context: context.clone(),
    })
}

crate::builtin_scanner!(build);
