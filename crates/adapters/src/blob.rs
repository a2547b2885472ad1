// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque blob storage boundary for result payloads and raw source data.
//!
//! The core only stores and forwards `BlobRef`s; payload bytes are never
//! interpreted here. Refs are content-addressed (sha256 of the bytes), so
//! identical payloads share one blob.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use thiserror::Error;

/// Opaque reference to a stored payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub String);

impl BlobRef {
    /// The content address of `bytes`.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(format!("blob-{:x}", Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from blob operations.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(BlobRef),
    #[error("blob io: {0}")]
    Io(#[from] std::io::Error),
    #[error("blob encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Adapter over the external key-value blob store.
#[async_trait]
pub trait BlobAdapter: Clone + Send + Sync + 'static {
    async fn put(&self, bytes: &[u8]) -> Result<BlobRef, BlobError>;
    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>, BlobError>;
}

/// File-backed blob store: one file per blob under a root directory.
#[derive(Clone)]
pub struct FsBlobAdapter {
    root: PathBuf,
}

impl FsBlobAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, blob: &BlobRef) -> PathBuf {
        self.root.join(blob.as_str())
    }
}

#[async_trait]
impl BlobAdapter for FsBlobAdapter {
    async fn put(&self, bytes: &[u8]) -> Result<BlobRef, BlobError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let blob = BlobRef::for_bytes(bytes);
        tokio::fs::write(self.path_for(&blob), bytes).await?;
        Ok(blob)
    }

    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>, BlobError> {
        match tokio::fs::read(self.path_for(blob)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(blob.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{BlobAdapter, BlobError, BlobRef};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// In-memory blob store for tests.
    #[derive(Clone, Default)]
    pub struct MemoryBlobAdapter {
        blobs: Arc<Mutex<HashMap<BlobRef, Vec<u8>>>>,
    }

    impl MemoryBlobAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.blobs.lock().len()
        }

        pub fn is_empty(&self) -> bool {
            self.blobs.lock().is_empty()
        }
    }

    #[async_trait]
    impl BlobAdapter for MemoryBlobAdapter {
        async fn put(&self, bytes: &[u8]) -> Result<BlobRef, BlobError> {
            let blob = BlobRef::for_bytes(bytes);
            self.blobs.lock().insert(blob.clone(), bytes.to_vec());
            Ok(blob)
        }

        async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>, BlobError> {
            self.blobs
                .lock()
                .get(blob)
                .cloned()
                .ok_or_else(|| BlobError::NotFound(blob.clone()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::MemoryBlobAdapter;

#[cfg(test)]
#[path = "blob_tests.rs"]
mod tests;
