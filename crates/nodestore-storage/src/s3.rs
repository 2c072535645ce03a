//! MinIO / S3-compatible object storage client.
//!
//! Wraps `aws-sdk-s3` to provide object metadata, streamed downloads and
//! presigned URL generation for the node data bucket.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::{
    config::{timeout::TimeoutConfig, Builder as S3Builder, Credentials, Region},
    Client,
};
use futures_util::StreamExt;

use crate::{ObjectBody, ObjectInfo, ObjectStore, StorageError};

/// Storage configuration (loaded from app config).
#[derive(Debug, Clone)]
pub struct S3Config {
    /// MinIO / S3 endpoint URL (e.g. `http://localhost:9000`)
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Upper bound for a single S3 operation.
    pub timeout: Duration,
}

/// S3/MinIO storage client wrapping the AWS SDK.
#[derive(Clone)]
pub struct S3Store {
    inner: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(cfg: &S3Config) -> Self {
        let creds = Credentials::new(
            &cfg.access_key,
            &cfg.secret_key,
            None, // session token
            None, // expiry
            "nodestore-storage",
        );

        let s3_cfg = S3Builder::new()
            .endpoint_url(&cfg.endpoint)
            .credentials_provider(creds)
            .region(Region::new(cfg.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(cfg.timeout)
                    .build(),
            )
            // Force path-style URLs (required for MinIO)
            .force_path_style(true)
            .build();

        Self {
            inner: Client::from_conf(s3_cfg),
            bucket: cfg.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Check that the bucket is reachable. The gateway is read-only, so a
    /// missing bucket is reported rather than created.
    pub async fn check_bucket(&self) -> Result<(), StorageError> {
        self.inner
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(classify)?;
        tracing::debug!(bucket = %self.bucket, "Bucket reachable");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head_object(&self, key: &str) -> Result<ObjectInfo, StorageError> {
        let out = self
            .inner
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        Ok(ObjectInfo {
            content_length: out.content_length().and_then(|n| u64::try_from(n).ok()),
            content_language: out.content_language().map(str::to_string),
        })
    }

    async fn get_object(&self, key: &str) -> Result<ObjectBody, StorageError> {
        let out = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        let content_length = out.content_length().and_then(|n| u64::try_from(n).ok());
        let stream = futures_util::stream::unfold(out.body, |mut body| async move {
            body.next()
                .await
                .map(|chunk| (chunk.map_err(std::io::Error::other), body))
        })
        .boxed();

        Ok(ObjectBody {
            content_length,
            stream,
        })
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let presigning_cfg = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::Other(format!("error getting presigned url: {e}")))?;

        let req = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_cfg)
            .await
            .map_err(|e| {
                StorageError::Other(format!(
                    "error getting presigned url: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(req.uri().to_string())
    }
}

/// Map an SDK error onto the not-found / other split the HTTP layer needs.
///
/// HEAD responses have no body, so a missing key there only shows up as a
/// bare 404 with the `NotFound` code.
fn classify<E>(err: SdkError<E>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    match err.code() {
        Some("NoSuchKey" | "NotFound") => StorageError::NotFound,
        Some("NoSuchBucket") => StorageError::NoSuchBucket,
        _ if status == Some(404) => StorageError::NotFound,
        _ => StorageError::Other(DisplayErrorContext(&err).to_string()),
    }
}
