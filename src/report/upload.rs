//! Artifact upload to S3

use crate::aws::api::AwsContext;
use crate::report::error::{ReportError, ReportResult};
use crate::report::traits::ExportFormat;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::path::{Component, Path, PathBuf};

/// Uploads report artifacts below a key prefix
pub struct S3Uploader {
    client: S3Client,
    bucket: String,
    prefix: String,
}

/// What an upload pass achieved
#[derive(Debug, Default)]
pub struct UploadSummary {
    pub uploaded: Vec<String>,
    pub failed: Vec<ReportError>,
}

impl UploadSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl S3Uploader {
    pub fn new(context: &AwsContext, bucket: impl Into<String>, prefix: Option<&str>) -> Self {
        Self {
            client: S3Client::new(context.base()),
            bucket: bucket.into(),
            prefix: normalize_prefix(prefix),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key for `path`, relative to the output directory
    pub fn key_for(&self, path: &Path, output_dir: &Path) -> String {
        let relative = path.strip_prefix(output_dir).unwrap_or(path);
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        format!("{}{}", self.prefix, parts.join("/"))
    }

    pub async fn upload(&self, path: &Path, key: &str) -> ReportResult<()> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ReportError::io("read artifact", path, e))?;
        let content_type = ExportFormat::for_path(path)
            .map(|f| f.mimetype())
            .unwrap_or("application/octet-stream");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| ReportError::Upload {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    /// Upload every artifact; individual failures are collected, not fatal
    pub async fn upload_all(&self, files: &[PathBuf], output_dir: &Path) -> UploadSummary {
        let mut summary = UploadSummary::default();
        log::info!(
            "Uploading {} files to s3://{}/{}",
            files.len(),
            self.bucket,
            self.prefix
        );
        for path in files {
            let key = self.key_for(path, output_dir);
            match self.upload(path, &key).await {
                Ok(()) => {
                    log::debug!("Uploaded {}", key);
                    summary.uploaded.push(key);
                }
                Err(err) => {
                    log::warn!("{}", err);
                    summary.failed.push(err);
                }
            }
        }
        log::info!(
            "Uploaded {}/{} files to S3",
            summary.uploaded.len(),
            files.len()
        );
        summary
    }
}

fn normalize_prefix(prefix: Option<&str>) -> String {
    match prefix.map(|p| p.trim_matches('/')) {
        Some(p) if !p.is_empty() => format!("{}/", p),
        _ => String::new(),
    }
}
