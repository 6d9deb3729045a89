//! # Bus Client
//!
//! Owns the broker connection lifecycle for one service process. The channel
//! is an explicitly owned, lazily initialized resource guarded by a
//! single-flight mutex: concurrent publish/subscribe calls during a
//! (re)connect never race to open duplicate connections.
//!
//! Connection failure is `BusError::BrokerUnavailable`. The startup sequence
//! treats it as fatal (after bounded retries with backoff); the publish path
//! treats it as logged-and-continue - the already-committed local mutation
//! is never rolled back for the sake of the bus.

use crate::events::DomainEvent;
use crate::exchange::{Subscription, TopicExchange};
use crate::pattern::PatternError;
use crate::DEFAULT_QUEUE_CAPACITY;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Errors from bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    /// The broker cannot be reached. Fatal at startup, warn at publish.
    #[error("event broker unavailable: {reason}")]
    BrokerUnavailable { reason: String },

    /// A subscribe call used a malformed binding pattern.
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    /// The event payload could not be serialized.
    #[error("failed to encode event payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Broker seam: opens the channel the client publishes and subscribes on.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Establish a connection and return the exchange channel.
    ///
    /// # Errors
    ///
    /// `BusError::BrokerUnavailable` when the broker cannot be reached.
    async fn open(&self) -> Result<Arc<TopicExchange>, BusError>;
}

/// In-process broker holding one exchange.
///
/// The availability switch exists so the unavailable paths (startup-fatal,
/// publish-warn) can be exercised without a real network partition.
pub struct InMemoryBroker {
    exchange: Arc<TopicExchange>,
    available: AtomicBool,
}

impl InMemoryBroker {
    /// Create a broker with an exchange of the given name.
    #[must_use]
    pub fn new(exchange_name: impl Into<String>, queue_capacity: usize) -> Self {
        Self {
            exchange: Arc::new(TopicExchange::new(exchange_name, queue_capacity)),
            available: AtomicBool::new(true),
        }
    }

    /// Create a broker with the default queue capacity.
    #[must_use]
    pub fn with_defaults(exchange_name: impl Into<String>) -> Self {
        Self::new(exchange_name, DEFAULT_QUEUE_CAPACITY)
    }

    /// Toggle reachability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Direct handle to the underlying exchange.
    #[must_use]
    pub fn exchange(&self) -> Arc<TopicExchange> {
        Arc::clone(&self.exchange)
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn open(&self) -> Result<Arc<TopicExchange>, BusError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(BusError::BrokerUnavailable {
                reason: "broker marked unavailable".to_owned(),
            });
        }
        Ok(Arc::clone(&self.exchange))
    }
}

/// Bounded reconnect policy: exponential backoff between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Connection attempts before giving up.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Ceiling for the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Per-process bus client.
pub struct BusClient {
    broker: Arc<dyn Broker>,
    channel: Mutex<Option<Arc<TopicExchange>>>,
}

impl BusClient {
    /// Create a client over a broker. No connection is opened until first
    /// use.
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self {
            broker,
            channel: Mutex::new(None),
        }
    }

    /// Establish the connection and channel. Idempotent: returns the
    /// existing channel when already connected. The mutex makes concurrent
    /// callers wait on a single in-flight connect.
    ///
    /// # Errors
    ///
    /// `BusError::BrokerUnavailable` when the broker cannot be reached;
    /// callers decide retry policy.
    pub async fn connect(&self) -> Result<Arc<TopicExchange>, BusError> {
        let mut channel = self.channel.lock().await;
        if let Some(existing) = channel.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let opened = self.broker.open().await?;
        info!(exchange = opened.name(), "Connected to event broker");
        *channel = Some(Arc::clone(&opened));
        Ok(opened)
    }

    /// Connect with bounded retries and exponential backoff.
    ///
    /// # Errors
    ///
    /// The last `BusError::BrokerUnavailable` once every attempt is spent.
    pub async fn connect_with_retry(
        &self,
        policy: &RetryPolicy,
    ) -> Result<Arc<TopicExchange>, BusError> {
        let mut attempt = 1;
        loop {
            match self.connect().await {
                Ok(channel) => return Ok(channel),
                Err(err) if attempt < policy.max_attempts => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Broker connect failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Publish a domain event under its routing key. Lazily connects first.
    /// Fire-and-forget: no delivery confirmation is awaited.
    ///
    /// # Errors
    ///
    /// `BusError::BrokerUnavailable` when no channel can be opened; the
    /// producer paths log this and keep going.
    pub async fn publish_event(&self, event: &DomainEvent) -> Result<(), BusError> {
        let channel = self.connect().await?;
        let body = event.payload_json()?;
        channel.publish(event.routing_key(), body);
        Ok(())
    }

    /// Declare a private queue bound with `pattern` and start consuming
    /// from it. Lazily connects first.
    ///
    /// # Errors
    ///
    /// `BusError::BrokerUnavailable` or `BusError::InvalidPattern`.
    pub async fn subscribe(&self, pattern: &str) -> Result<Subscription, BusError> {
        let channel = self.connect().await?;
        Ok(channel.subscribe(pattern)?)
    }
}
