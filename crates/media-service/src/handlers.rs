//! # Media Event Handlers
//!
//! Cascading delete on `post.deleted`. Each media identifier in the payload
//! is one idempotent unit of work: an absent blob is a logged no-op, so a
//! redelivered event re-runs only the deletes that have not landed yet.

use crate::ports::BlobStore;
use async_trait::async_trait;
use shared_bus::{DomainEvent, EventHandler, HandlerError};
use std::sync::Arc;
use tracing::{debug, info};

/// `post.deleted` → delete every attached blob and its metadata record.
pub struct PostDeletedHandler {
    blobs: Arc<dyn BlobStore>,
}

impl PostDeletedHandler {
    /// Bind the handler to the service's blob store.
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }
}

#[async_trait]
impl EventHandler for PostDeletedHandler {
    fn name(&self) -> &'static str {
        "media.post-deleted"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        let DomainEvent::PostDeleted(payload) = event else {
            return Ok(());
        };

        for media_id in &payload.media_ids {
            match self.blobs.delete(media_id).await {
                Ok(true) => {
                    info!(media_id = %media_id, post_id = %payload.post_id, "Media blob deleted");
                }
                Ok(false) => {
                    debug!(media_id = %media_id, "Media blob already absent");
                }
                Err(err) => {
                    // Unacknowledged: the whole event is redelivered, and the
                    // identifiers already deleted fall into the no-op branch.
                    return Err(HandlerError::effect(format!(
                        "deleting media {media_id}: {err}"
                    )));
                }
            }
        }

        Ok(())
    }
}
