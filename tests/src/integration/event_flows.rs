//! # Event Flow Tests
//!
//! The full choreography over a wired runtime:
//!
//! ```text
//! [Post Service] ──post.created──→ [Exchange] ──→ [Search]
//!                ──post.deleted──→ [Exchange] ──→ [Search], [Media]
//! ```
//!
//! Derived state (search index, blob store) is eventually consistent with
//! the post store; the tests poll for convergence rather than assuming
//! synchronous delivery.

#[cfg(test)]
mod tests {
    use crate::support::{eventually, runtime};
    use chrono::Utc;
    use media_service::{BlobMetadata, BlobStore};
    use shared_bus::DomainEvent;
    use shared_types::{MediaId, PostId, PostRecord, UserId};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_created_post_becomes_searchable() {
        let rt = runtime().await;

        let post = rt
            .posts
            .create_post(UserId::new("u1"), "quantum ducks migrate".into(), Vec::new())
            .await
            .unwrap();

        let search = Arc::clone(&rt.search);
        eventually(move || search.query("ducks").len() == 1).await;
        assert_eq!(rt.search.query("ducks")[0].post_id, post.id);
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_delete_cascades_to_search_and_media() {
        let rt = runtime().await;

        // Media uploaded first, then attached to the post.
        for id in ["m1", "m2"] {
            rt.media
                .put(
                    BlobMetadata {
                        media_id: MediaId::new(id),
                        owner: UserId::new("u1"),
                        uploaded_at: Utc::now(),
                    },
                    b"bytes".to_vec(),
                )
                .await
                .unwrap();
        }

        let post = rt
            .posts
            .create_post(
                UserId::new("u1"),
                "vanishing act".into(),
                vec![MediaId::new("m1"), MediaId::new("m2")],
            )
            .await
            .unwrap();

        let search = Arc::clone(&rt.search);
        eventually(move || search.query("vanishing").len() == 1).await;

        rt.posts.delete_post(&post.id, &post.user_id).await.unwrap();

        let search = Arc::clone(&rt.search);
        eventually(move || search.query("vanishing").is_empty()).await;

        // Blob deletion is async; poll until both attachments are gone.
        timeout(Duration::from_secs(2), async {
            loop {
                let gone = !rt.media.contains(&MediaId::new("m1")).await.unwrap()
                    && !rt.media.contains(&MediaId::new("m2")).await.unwrap();
                if gone {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("media cascade not observed in time");
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_unrelated_posts_commute() {
        let rt = runtime().await;

        let first = rt
            .posts
            .create_post(UserId::new("u1"), "alpha canyon".into(), Vec::new())
            .await
            .unwrap();
        rt.posts
            .create_post(UserId::new("u2"), "beta canyon".into(), Vec::new())
            .await
            .unwrap();

        let search = Arc::clone(&rt.search);
        eventually(move || search.query("canyon").len() == 2).await;

        rt.posts.delete_post(&first.id, &first.user_id).await.unwrap();

        let search = Arc::clone(&rt.search);
        eventually(move || search.query("canyon").len() == 1).await;
        assert_eq!(rt.search.query("beta").len(), 1);
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        let rt = runtime().await;
        let exchange = rt.broker.exchange();

        let record = PostRecord {
            id: PostId::new("p-dup"),
            user_id: UserId::new("u1"),
            content: "echoing delivery".into(),
            media_ids: Vec::new(),
            created_at: Utc::now(),
        };
        let event = DomainEvent::post_created(&record);
        let body = event.payload_json().unwrap();

        // The broker redelivers at least once; twice here.
        exchange.publish(event.routing_key(), body.clone());
        exchange.publish(event.routing_key(), body);

        // A marker event published after both copies; once it is visible,
        // both duplicates have been consumed.
        let marker = DomainEvent::post_created(&PostRecord {
            id: PostId::new("p-marker"),
            user_id: UserId::new("u1"),
            content: "marker".into(),
            media_ids: Vec::new(),
            created_at: Utc::now(),
        });
        exchange.publish(marker.routing_key(), marker.payload_json().unwrap());

        let search = Arc::clone(&rt.search);
        eventually(move || search.query("marker").len() == 1).await;
        assert_eq!(rt.search.query("echoing").len(), 1);
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_wildcard_bindings_observe_the_lifecycle() {
        let rt = runtime().await;
        let exchange = rt.broker.exchange();

        let mut single = exchange.subscribe("post.*").unwrap();
        let mut all = exchange.subscribe("#").unwrap();

        let post = rt
            .posts
            .create_post(UserId::new("u1"), "audited".into(), Vec::new())
            .await
            .unwrap();
        rt.posts.delete_post(&post.id, &post.user_id).await.unwrap();

        for sub in [&mut single, &mut all] {
            let created = timeout(Duration::from_secs(2), sub.recv()).await.unwrap().unwrap();
            assert_eq!(created.routing_key, "post.created");
            let deleted = timeout(Duration::from_secs(2), sub.recv()).await.unwrap().unwrap();
            assert_eq!(deleted.routing_key, "post.deleted");
        }
        rt.shutdown();
    }
}
