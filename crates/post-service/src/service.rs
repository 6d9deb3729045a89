//! # Producer Paths
//!
//! Couples a committed mutation to event emission and cache invalidation.
//! Neither the bus nor the cache may fail a request once the primary store
//! has committed: publish failures drop the event with a warning (the
//! documented at-most-once weak spot), cache failures cost freshness only.

use crate::error::PostError;
use crate::ports::PostStore;
use chrono::Utc;
use shared_bus::{BusClient, DomainEvent};
use shared_cache::{keys, CacheStore};
use shared_types::{MediaId, PostId, PostPage, PostRecord, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// The post service: producer side of the post lifecycle.
pub struct PostService {
    store: Arc<dyn PostStore>,
    cache: Arc<dyn CacheStore>,
    bus: Arc<BusClient>,
    post_ttl: Duration,
    listing_ttl: Duration,
}

impl PostService {
    /// Wire the service over its collaborators with the default TTLs.
    pub fn new(store: Arc<dyn PostStore>, cache: Arc<dyn CacheStore>, bus: Arc<BusClient>) -> Self {
        Self::with_ttls(store, cache, bus, shared_cache::POST_TTL, shared_cache::LISTING_TTL)
    }

    /// Wire the service with explicit cache TTLs.
    pub fn with_ttls(
        store: Arc<dyn PostStore>,
        cache: Arc<dyn CacheStore>,
        bus: Arc<BusClient>,
        post_ttl: Duration,
        listing_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            bus,
            post_ttl,
            listing_ttl,
        }
    }

    /// Create a post: commit, publish `post.created`, invalidate caches.
    ///
    /// # Errors
    ///
    /// Only primary-store failures; bus and cache trouble never fails a
    /// committed create.
    pub async fn create_post(
        &self,
        user_id: UserId,
        content: String,
        media_ids: Vec<MediaId>,
    ) -> Result<PostRecord, PostError> {
        let post = PostRecord {
            id: PostId::new(Uuid::new_v4().to_string()),
            user_id,
            content,
            media_ids,
            created_at: Utc::now(),
        };

        self.store.insert(post.clone()).await?;
        info!(post_id = %post.id, "Post created");

        self.publish(DomainEvent::post_created(&post)).await;
        self.invalidate_post_cache(&post.id).await;

        Ok(post)
    }

    /// Delete a post owned by `user_id`: commit the deletion, publish
    /// `post.deleted` (carrying the attached media ids), invalidate caches.
    ///
    /// # Errors
    ///
    /// `PostError::NotFound` when no matching post exists.
    pub async fn delete_post(&self, post_id: &PostId, user_id: &UserId) -> Result<(), PostError> {
        let Some(post) = self.store.delete(post_id, user_id).await? else {
            return Err(PostError::NotFound);
        };
        info!(post_id = %post.id, "Post deleted");

        self.publish(DomainEvent::post_deleted(&post)).await;
        self.invalidate_post_cache(&post.id).await;

        Ok(())
    }

    /// Fetch one post, read-through cached.
    ///
    /// # Errors
    ///
    /// `PostError::NotFound` when the post exists in neither cache nor
    /// primary store.
    pub async fn get_post(&self, post_id: &PostId) -> Result<PostRecord, PostError> {
        let key = keys::post_key(post_id);
        if let Some(post) = self.cached::<PostRecord>(&key).await {
            return Ok(post);
        }

        let Some(post) = self.store.get(post_id).await? else {
            return Err(PostError::NotFound);
        };

        self.populate(&key, &post, self.post_ttl).await;
        Ok(post)
    }

    /// Fetch one listing page, read-through cached with the shorter
    /// aggregate-view TTL.
    ///
    /// # Errors
    ///
    /// Primary-store failures only; an empty page is a valid result.
    pub async fn list_posts(&self, page: usize, limit: usize) -> Result<PostPage, PostError> {
        let page = page.max(1);
        let key = keys::post_page_key(page);
        if let Some(listing) = self.cached::<PostPage>(&key).await {
            return Ok(listing);
        }

        let (posts, total_posts) = self.store.list(page, limit).await?;
        let listing = PostPage {
            posts,
            current_page: page,
            total_pages: total_posts.div_ceil(limit.max(1)),
            total_posts,
        };

        self.populate(&key, &listing, self.listing_ttl).await;
        Ok(listing)
    }

    /// Delete the single-resource key and every listing page key. Each step
    /// is attempted independently; a failure logs and moves on - cache
    /// inconsistency degrades read freshness, never the primary store.
    pub async fn invalidate_post_cache(&self, post_id: &PostId) {
        let single = keys::post_key(post_id);
        if let Err(err) = self.cache.delete(std::slice::from_ref(&single)).await {
            warn!(key = %single, error = %err, "Skipping single-record invalidation");
        }
        match self.cache.delete_matching(keys::post_listing_pattern()).await {
            Ok(deleted) => {
                if deleted > 0 {
                    info!(post_id = %post_id, deleted, "Listing cache invalidated");
                }
            }
            Err(err) => {
                warn!(post_id = %post_id, error = %err, "Skipping listing cache invalidation");
            }
        }
    }

    /// Publish best-effort: a committed mutation is never rolled back for
    /// the bus, so failures here drop the event with a warning.
    async fn publish(&self, event: DomainEvent) {
        let routing_key = event.routing_key();
        if let Err(err) = self.bus.publish_event(&event).await {
            warn!(routing_key, error = %err, "Event dropped, derived state will lag");
        }
    }

    async fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key, error = %err, "Corrupt cache entry, treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key, error = %err, "Cache read failed, falling back to primary store");
                None
            }
        }
    }

    async fn populate<T: serde::Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                if let Err(err) = self.cache.set_with_ttl(key, bytes, ttl).await {
                    warn!(key, error = %err, "Cache populate failed");
                }
            }
            Err(err) => warn!(key, error = %err, "Cache serialize failed"),
        }
    }
}
