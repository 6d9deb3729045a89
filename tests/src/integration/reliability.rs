//! # Reliability Tests
//!
//! Delivery semantics under failure: redelivery until a flaky handler
//! converges, and dead-lettering for messages that can never be applied so
//! a poison payload cannot pin its queue.

#[cfg(test)]
mod tests {
    use crate::support::{eventually, runtime};
    use async_trait::async_trait;
    use chrono::Utc;
    use shared_bus::{
        spawn_consumer, ConsumerPolicy, DomainEvent, EventHandler, HandlerError, InMemoryBroker,
        DLQ_TOPIC,
    };
    use shared_types::{PostId, PostRecord, UserId};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn created(post_id: &str, content: &str) -> DomainEvent {
        DomainEvent::post_created(&PostRecord {
            id: PostId::new(post_id),
            user_id: UserId::new("u1"),
            content: content.into(),
            media_ids: Vec::new(),
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_poison_payload_lands_in_dlq_not_the_queue() {
        let rt = runtime().await;
        let exchange = rt.broker.exchange();
        let mut dlq = exchange.subscribe(DLQ_TOPIC).unwrap();

        exchange.publish("post.created", b"not json".to_vec());

        let dead = timeout(Duration::from_secs(2), dlq.recv()).await.unwrap().unwrap();
        assert_eq!(dead.body, b"not json");

        // The queue keeps flowing after the poison message.
        let event = created("p-after", "still flowing");
        exchange.publish(event.routing_key(), event.payload_json().unwrap());
        let search = Arc::clone(&rt.search);
        eventually(move || search.query("flowing").len() == 1).await;
        rt.shutdown();
    }

    #[tokio::test]
    async fn test_poison_delete_dead_letters_once_per_consumer() {
        // post.deleted has two consumers (search, media); each owns its queue
        // and dead-letters its own copy.
        let rt = runtime().await;
        let exchange = rt.broker.exchange();
        let mut dlq = exchange.subscribe(DLQ_TOPIC).unwrap();

        exchange.publish("post.deleted", b"{\"broken\"".to_vec());

        for _ in 0..2 {
            let dead = timeout(Duration::from_secs(2), dlq.recv()).await.unwrap().unwrap();
            assert_eq!(dead.body, b"{\"broken\"");
        }
        rt.shutdown();
    }

    /// Applies the event only after `fail_first` rejected attempts.
    struct FlakyHandler {
        failures_left: AtomicU32,
        applied: AtomicU32,
    }

    #[async_trait]
    impl EventHandler for FlakyHandler {
        fn name(&self) -> &'static str {
            "test.flaky"
        }

        async fn handle(&self, _event: &DomainEvent) -> Result<(), HandlerError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(HandlerError::effect("transient"));
            }
            self.applied.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_flaky_consumer_converges_within_redelivery_budget() {
        let broker = InMemoryBroker::with_defaults("test_events");
        let exchange = broker.exchange();
        let handler = Arc::new(FlakyHandler {
            failures_left: AtomicU32::new(3),
            applied: AtomicU32::new(0),
        });

        let task = spawn_consumer(
            exchange.subscribe("post.created").unwrap(),
            Arc::clone(&handler) as _,
            ConsumerPolicy { max_redeliveries: 5 },
        );

        let event = created("p1", "retry me");
        exchange.publish(event.routing_key(), event.payload_json().unwrap());

        // Applied exactly once despite three rejected deliveries before it.
        eventually(|| handler.applied.load(Ordering::SeqCst) == 1).await;
        task.abort();
    }

    #[tokio::test]
    async fn test_exhausted_redeliveries_dead_letter_instead_of_looping() {
        let broker = InMemoryBroker::with_defaults("test_events");
        let exchange = broker.exchange();
        let mut dlq = exchange.subscribe(DLQ_TOPIC).unwrap();
        let handler = Arc::new(FlakyHandler {
            failures_left: AtomicU32::new(u32::MAX),
            applied: AtomicU32::new(0),
        });

        let task = spawn_consumer(
            exchange.subscribe("post.created").unwrap(),
            Arc::clone(&handler) as _,
            ConsumerPolicy { max_redeliveries: 3 },
        );

        let event = created("p1", "never applies");
        exchange.publish(event.routing_key(), event.payload_json().unwrap());

        let dead = timeout(Duration::from_secs(2), dlq.recv()).await.unwrap().unwrap();
        assert_eq!(dead.routing_key, DLQ_TOPIC);
        assert_eq!(handler.applied.load(Ordering::SeqCst), 0);
        task.abort();
    }
}
