//! # Service Wiring
//!
//! Assembles the runtime: broker, bus client, shared cache, the three
//! services, their consumer tasks, and the cache GC sweep.
//!
//! Subscriptions bound here:
//!
//! - search: `post.created`, `post.deleted`
//! - media: `post.deleted`

use crate::config::RuntimeConfig;
use media_service::InMemoryBlobStore;
use post_service::{InMemoryPostStore, PostService};
use search_service::SearchIndex;
use shared_bus::{spawn_consumer, Broker, BusClient, BusError, ConsumerPolicy, InMemoryBroker};
use shared_cache::{FixedWindowLimiter, InMemoryCacheStore};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

/// Errors that abort runtime startup.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The event broker could not be reached within the retry budget.
    /// Fatal: the process must not serve traffic without its bus.
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// The assembled runtime.
pub struct Runtime {
    /// Producer-side post service.
    pub posts: Arc<PostService>,
    /// Search service's derived index (read side: queries).
    pub search: Arc<SearchIndex>,
    /// Media service's blob store.
    pub media: Arc<InMemoryBlobStore>,
    /// Shared cache store.
    pub cache: Arc<InMemoryCacheStore>,
    /// Bus client of this process.
    pub bus: Arc<BusClient>,
    /// Broker handle (kept for its exchange; tests flip availability).
    pub broker: Arc<InMemoryBroker>,
    /// Global admission control.
    pub global_limiter: Arc<FixedWindowLimiter>,
    /// Admission control for sensitive endpoints.
    pub sensitive_limiter: Arc<FixedWindowLimiter>,
    tasks: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Build and start the runtime per `config`.
    ///
    /// # Errors
    ///
    /// `RuntimeError::Bus` when the broker stays unreachable through the
    /// configured retries; the startup sequence treats this as fatal.
    pub async fn start(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let broker = Arc::new(InMemoryBroker::new(
            config.bus.exchange_name.clone(),
            config.bus.queue_capacity,
        ));
        Self::start_with_broker(config, broker).await
    }

    /// Build and start the runtime against an existing broker handle.
    ///
    /// # Errors
    ///
    /// Same contract as [`start`](Self::start).
    pub async fn start_with_broker(
        config: RuntimeConfig,
        broker: Arc<InMemoryBroker>,
    ) -> Result<Self, RuntimeError> {
        let bus = Arc::new(BusClient::new(Arc::clone(&broker) as Arc<dyn Broker>));
        bus.connect_with_retry(&config.bus.connect).await?;

        let cache = Arc::new(InMemoryCacheStore::new());
        let posts = Arc::new(PostService::with_ttls(
            Arc::new(InMemoryPostStore::new()),
            Arc::clone(&cache) as _,
            Arc::clone(&bus),
            config.cache.post_ttl,
            config.cache.listing_ttl,
        ));
        let search = Arc::new(SearchIndex::new());
        let media = Arc::new(InMemoryBlobStore::new());

        let policy = ConsumerPolicy {
            max_redeliveries: config.bus.max_redeliveries,
        };
        let mut tasks = vec![
            spawn_consumer(
                bus.subscribe("post.created").await?,
                Arc::new(search_service::PostCreatedHandler::new(Arc::clone(&search))),
                policy.clone(),
            ),
            spawn_consumer(
                bus.subscribe("post.deleted").await?,
                Arc::new(search_service::PostDeletedHandler::new(Arc::clone(&search))),
                policy.clone(),
            ),
            spawn_consumer(
                bus.subscribe("post.deleted").await?,
                Arc::new(media_service::PostDeletedHandler::new(
                    Arc::clone(&media) as _
                )),
                policy,
            ),
        ];

        // Periodic sweep of expired cache entries.
        tasks.push({
            let cache = Arc::clone(&cache);
            let interval = config.cache.gc_interval;
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    cache.purge_expired();
                }
            })
        });

        let global_limiter = Arc::new(FixedWindowLimiter::new(
            Arc::clone(&cache) as _,
            "global",
            config.rate_limit.global_budget,
            config.rate_limit.global_window,
        ));
        let sensitive_limiter = Arc::new(FixedWindowLimiter::new(
            Arc::clone(&cache) as _,
            "sensitive",
            config.rate_limit.sensitive_budget,
            config.rate_limit.sensitive_window,
        ));

        info!(
            exchange = %config.bus.exchange_name,
            consumers = tasks.len() - 1,
            "Runtime started"
        );

        Ok(Self {
            posts,
            search,
            media,
            cache,
            bus,
            broker,
            global_limiter,
            sensitive_limiter,
            tasks,
        })
    }

    /// Stop consumer and GC tasks. In-flight messages are dropped, which is
    /// the documented behavior for a subscriber going away.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        info!("Runtime stopped");
    }
}
