//! # Outbound Ports
//!
//! The primary store the post service commits to. CRUD persistence is an
//! external collaborator; the port captures the only contract the event
//! subsystem cares about: globally unique ids, and deletion returning the
//! removed record so its media ids can travel in the `post.deleted` payload.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{PostId, PostRecord, UserId};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from the primary store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store backend failed.
    #[error("primary store failure: {reason}")]
    Backend { reason: String },
}

/// Abstract interface for post persistence.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Commit a new post.
    async fn insert(&self, post: PostRecord) -> Result<(), StoreError>;

    /// Fetch a post by id.
    async fn get(&self, id: &PostId) -> Result<Option<PostRecord>, StoreError>;

    /// Delete a post owned by `user`. Returns the removed record, or `None`
    /// when no matching post exists.
    async fn delete(&self, id: &PostId, user: &UserId) -> Result<Option<PostRecord>, StoreError>;

    /// One page of posts, newest first, plus the total post count.
    async fn list(&self, page: usize, limit: usize)
        -> Result<(Vec<PostRecord>, usize), StoreError>;
}

/// In-memory primary store.
#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<HashMap<PostId, PostRecord>>,
}

impl InMemoryPostStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: PostRecord) -> Result<(), StoreError> {
        self.posts.write().insert(post.id.clone(), post);
        Ok(())
    }

    async fn get(&self, id: &PostId) -> Result<Option<PostRecord>, StoreError> {
        Ok(self.posts.read().get(id).cloned())
    }

    async fn delete(&self, id: &PostId, user: &UserId) -> Result<Option<PostRecord>, StoreError> {
        let mut posts = self.posts.write();
        let owned = posts.get(id).is_some_and(|post| &post.user_id == user);
        if !owned {
            return Ok(None);
        }
        Ok(posts.remove(id))
    }

    async fn list(
        &self,
        page: usize,
        limit: usize,
    ) -> Result<(Vec<PostRecord>, usize), StoreError> {
        let posts = self.posts.read();
        let total = posts.len();

        let mut ordered: Vec<PostRecord> = posts.values().cloned().collect();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let start = page.saturating_sub(1) * limit;
        let slice = ordered.into_iter().skip(start).take(limit).collect();
        Ok((slice, total))
    }
}
