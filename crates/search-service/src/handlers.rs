//! # Search Event Handlers
//!
//! The only writers of the search index. Each handler is registered against
//! one routing key; events outside that key are ignored rather than treated
//! as errors, since a wildcard binding may deliver more than the handler's
//! own key.

use crate::index::{SearchDocument, SearchIndex};
use async_trait::async_trait;
use shared_bus::{DomainEvent, EventHandler, HandlerError};
use std::sync::Arc;

/// `post.created` → idempotent upsert into the search index.
pub struct PostCreatedHandler {
    index: Arc<SearchIndex>,
}

impl PostCreatedHandler {
    /// Bind the handler to the service's index.
    pub fn new(index: Arc<SearchIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl EventHandler for PostCreatedHandler {
    fn name(&self) -> &'static str {
        "search.post-created"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        if let DomainEvent::PostCreated(payload) = event {
            self.index.upsert(SearchDocument {
                post_id: payload.post_id.clone(),
                user_id: payload.user_id.clone(),
                content: payload.content.clone(),
                created_at: payload.created_at,
            });
        }
        Ok(())
    }
}

/// `post.deleted` → idempotent removal from the search index.
pub struct PostDeletedHandler {
    index: Arc<SearchIndex>,
}

impl PostDeletedHandler {
    /// Bind the handler to the service's index.
    pub fn new(index: Arc<SearchIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl EventHandler for PostDeletedHandler {
    fn name(&self) -> &'static str {
        "search.post-deleted"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError> {
        if let DomainEvent::PostDeleted(payload) = event {
            self.index.remove(&payload.post_id);
        }
        Ok(())
    }
}
