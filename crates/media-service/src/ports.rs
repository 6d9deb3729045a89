//! # Outbound Ports
//!
//! The blob store is an external collaborator (object storage plus a
//! metadata table); the only contract the event subsystem relies on is
//! `delete(identifier)` being idempotent per identifier.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use shared_types::{MediaId, UserId};
use thiserror::Error;

/// Errors from blob storage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// The storage backend failed; the delete may not have applied.
    #[error("blob store failure: {reason}")]
    Backend { reason: String },
}

/// Metadata record kept alongside a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub media_id: MediaId,
    pub owner: UserId,
    pub uploaded_at: DateTime<Utc>,
}

/// Abstract interface for media blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob and its metadata record.
    async fn put(&self, metadata: BlobMetadata, bytes: Vec<u8>) -> Result<(), BlobError>;

    /// Delete a blob and its metadata. Returns `true` when something was
    /// deleted, `false` when the identifier was already absent.
    async fn delete(&self, media_id: &MediaId) -> Result<bool, BlobError>;

    /// Whether a blob exists.
    async fn contains(&self, media_id: &MediaId) -> Result<bool, BlobError>;
}

/// In-memory blob store.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: DashMap<MediaId, Vec<u8>>,
    metadata: DashMap<MediaId, BlobMetadata>,
}

impl InMemoryBlobStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, metadata: BlobMetadata, bytes: Vec<u8>) -> Result<(), BlobError> {
        self.blobs.insert(metadata.media_id.clone(), bytes);
        self.metadata.insert(metadata.media_id.clone(), metadata);
        Ok(())
    }

    async fn delete(&self, media_id: &MediaId) -> Result<bool, BlobError> {
        let had_blob = self.blobs.remove(media_id).is_some();
        self.metadata.remove(media_id);
        Ok(had_blob)
    }

    async fn contains(&self, media_id: &MediaId) -> Result<bool, BlobError> {
        Ok(self.blobs.contains_key(media_id))
    }
}
