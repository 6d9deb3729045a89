//! # Cache Consistency Tests
//!
//! The shared cache is derived state: populated by read-through, torn down
//! by invalidation on every mutation, and bounded by TTL for anything the
//! invalidation path misses.

#[cfg(test)]
mod tests {
    use crate::support::{eventually, runtime, runtime_with};
    use post_service::PostError;
    use service_runtime::RuntimeConfig;
    use shared_cache::{keys, CacheStore};
    use shared_types::UserId;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_read_through_populates_named_keys() {
        let rt = runtime().await;

        let post = rt
            .posts
            .create_post(UserId::new("u1"), "cached content".into(), Vec::new())
            .await
            .unwrap();

        // Mutations invalidate; only reads populate.
        let single = keys::post_key(&post.id);
        assert_eq!(rt.cache.get(&single).await.unwrap(), None);

        rt.posts.get_post(&post.id).await.unwrap();
        rt.posts.list_posts(1, 10).await.unwrap();

        assert!(rt.cache.get(&single).await.unwrap().is_some());
        assert!(rt.cache.get(&keys::post_page_key(1)).await.unwrap().is_some());
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_mutation_invalidates_every_listing_page() {
        let rt = runtime().await;

        for i in 0..5 {
            rt.posts
                .create_post(UserId::new("u1"), format!("post number {i}"), Vec::new())
                .await
                .unwrap();
        }
        rt.posts.list_posts(1, 2).await.unwrap();
        rt.posts.list_posts(2, 2).await.unwrap();
        assert!(rt.cache.get(&keys::post_page_key(2)).await.unwrap().is_some());

        // A new post must not leave any stale page behind.
        rt.posts
            .create_post(UserId::new("u1"), "the sixth".into(), Vec::new())
            .await
            .unwrap();

        assert_eq!(rt.cache.get(&keys::post_page_key(1)).await.unwrap(), None);
        assert_eq!(rt.cache.get(&keys::post_page_key(2)).await.unwrap(), None);

        let page = rt.posts.list_posts(1, 10).await.unwrap();
        assert_eq!(page.total_posts, 6);
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_deleted_post_is_gone_from_cache_and_store() {
        let rt = runtime().await;

        let post = rt
            .posts
            .create_post(UserId::new("u1"), "short lived".into(), Vec::new())
            .await
            .unwrap();
        rt.posts.get_post(&post.id).await.unwrap();

        rt.posts.delete_post(&post.id, &post.user_id).await.unwrap();

        assert_eq!(rt.cache.get(&keys::post_key(&post.id)).await.unwrap(), None);
        assert!(matches!(
            rt.posts.get_post(&post.id).await,
            Err(PostError::NotFound)
        ));
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_listing_ttl_bounds_staleness() {
        let mut config = RuntimeConfig::default();
        config.cache.listing_ttl = Duration::from_millis(40);
        let rt = runtime_with(config).await;

        rt.posts
            .create_post(UserId::new("u1"), "ephemeral".into(), Vec::new())
            .await
            .unwrap();
        rt.posts.list_posts(1, 10).await.unwrap();
        assert!(rt.cache.get(&keys::post_page_key(1)).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(rt.cache.get(&keys::post_page_key(1)).await.unwrap(), None);
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_gc_sweeps_expired_entries() {
        let mut config = RuntimeConfig::default();
        config.cache.post_ttl = Duration::from_millis(30);
        config.cache.listing_ttl = Duration::from_millis(30);
        config.cache.gc_interval = Duration::from_millis(20);
        let rt = runtime_with(config).await;

        let post = rt
            .posts
            .create_post(UserId::new("u1"), "to be swept".into(), Vec::new())
            .await
            .unwrap();
        rt.posts.get_post(&post.id).await.unwrap();
        rt.posts.list_posts(1, 10).await.unwrap();
        assert!(rt.cache.len() > 0);

        // The sweep removes the entries without any read touching them.
        let cache = Arc::clone(&rt.cache);
        eventually(move || cache.is_empty()).await;
        rt.shutdown();
    }
}
