//! # nodestore-storage
//!
//! Read-only object store access. The HTTP layer talks to an [`ObjectStore`]
//! and never to a concrete client:
//! - **S3 / MinIO** (`s3.rs`): production backend on `aws-sdk-s3`
//! - **Memory** (`memory.rs`): in-process backend for tests and local runs

pub mod memory;
pub mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

/// Object body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Object metadata returned by [`ObjectStore::head_object`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    pub content_length: Option<u64>,
    pub content_language: Option<String>,
}

/// Object contents returned by [`ObjectStore::get_object`].
pub struct ObjectBody {
    pub content_length: Option<u64>,
    pub stream: ByteStream,
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no such key")]
    NotFound,

    #[error("no such bucket")]
    NoSuchBucket,

    #[error("{0}")]
    Other(String),
}

impl StorageError {
    /// Whether the error means the object is absent (key or bucket).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound | Self::NoSuchBucket)
    }
}

/// Read access to objects by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn head_object(&self, key: &str) -> Result<ObjectInfo, StorageError>;

    async fn get_object(&self, key: &str) -> Result<ObjectBody, StorageError>;

    /// URL that allows a direct GET of `key` for `ttl`.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;
}
