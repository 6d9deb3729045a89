//! # Topic Exchange
//!
//! The exchange owns the binding table: `(pattern, queue)` pairs declared by
//! subscribers. Publishing routes a copy of the message to every bound queue
//! whose pattern matches the routing key; queues live exactly as long as
//! their `Subscription` handle.

use crate::pattern::{BindingPattern, PatternError};
use crate::DLQ_TOPIC;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// A message as delivered to one subscriber queue.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Routing key the message was published under.
    pub routing_key: String,
    /// UTF-8 JSON payload.
    pub body: Vec<u8>,
    /// When the producer emitted the event.
    pub emitted_at: DateTime<Utc>,
    /// How many times this message has been redelivered to this queue.
    pub redeliveries: u32,
}

struct Binding {
    id: Uuid,
    pattern: BindingPattern,
    sender: mpsc::Sender<Delivery>,
}

/// In-process topic exchange shared by all services of the runtime.
///
/// Suitable for single-node operation; a distributed deployment would bind
/// the same ports to an external broker instead.
pub struct TopicExchange {
    name: String,
    capacity: usize,
    bindings: RwLock<Vec<Binding>>,
    events_published: AtomicU64,
}

impl TopicExchange {
    /// Create an exchange with the given per-queue capacity.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            bindings: RwLock::new(Vec::new()),
            events_published: AtomicU64::new(0),
        }
    }

    /// The exchange name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publish a message. Fire-and-forget: returns the number of queues the
    /// message was routed to; no delivery confirmation is awaited.
    pub fn publish(&self, routing_key: &str, body: Vec<u8>) -> usize {
        self.events_published.fetch_add(1, Ordering::Relaxed);

        let delivery = Delivery {
            routing_key: routing_key.to_owned(),
            body,
            emitted_at: Utc::now(),
            redeliveries: 0,
        };

        let mut routed = 0;
        let mut stale = Vec::new();
        {
            let bindings = self.bindings.read();
            for binding in bindings.iter() {
                if !binding.pattern.matches(routing_key) {
                    continue;
                }
                match binding.sender.try_send(delivery.clone()) {
                    Ok(()) => routed += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            exchange = %self.name,
                            routing_key,
                            pattern = binding.pattern.as_str(),
                            "Subscriber queue full, dropping copy"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => stale.push(binding.id),
                }
            }
        }

        for id in stale {
            self.unbind(id);
        }

        if routed == 0 {
            // No bindings matched - every subscriber copy is lost.
            warn!(exchange = %self.name, routing_key, "Event published with no matching queues");
        } else {
            debug!(exchange = %self.name, routing_key, routed, "Event published");
        }
        routed
    }

    /// Declare a private queue, bind it with `pattern`, and return the
    /// subscription handle. The queue is auto-deleted when the handle drops.
    ///
    /// # Errors
    ///
    /// `PatternError::Invalid` for malformed binding patterns.
    pub fn subscribe(self: &Arc<Self>, pattern: &str) -> Result<Subscription, PatternError> {
        let pattern = BindingPattern::parse(pattern)?;
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();

        self.bindings.write().push(Binding {
            id,
            pattern: pattern.clone(),
            sender: sender.clone(),
        });

        debug!(exchange = %self.name, pattern = pattern.as_str(), "Queue bound");

        Ok(Subscription {
            id,
            pattern,
            receiver,
            requeue: sender,
            exchange: Arc::clone(self),
        })
    }

    /// Number of live bindings.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.read().len()
    }

    /// Total events published through this exchange.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    fn unbind(&self, id: Uuid) {
        let mut bindings = self.bindings.write();
        if let Some(index) = bindings.iter().position(|b| b.id == id) {
            let binding = bindings.swap_remove(index);
            debug!(exchange = %self.name, pattern = binding.pattern.as_str(), "Queue unbound");
        }
    }
}

/// A private queue bound to the exchange.
///
/// Dropping the handle unbinds the queue; messages still buffered are lost,
/// which is the documented behavior for a subscriber that goes away.
pub struct Subscription {
    id: Uuid,
    pattern: BindingPattern,
    receiver: mpsc::Receiver<Delivery>,
    requeue: mpsc::Sender<Delivery>,
    exchange: Arc<TopicExchange>,
}

impl Subscription {
    /// Receive the next delivery.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    /// Receive the next delivery without waiting.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.receiver.try_recv().ok()
    }

    /// Put an unacknowledged delivery back on the queue with its redelivery
    /// count bumped.
    pub fn requeue(&self, mut delivery: Delivery) {
        delivery.redeliveries += 1;
        let routing_key = delivery.routing_key.clone();
        if self.requeue.try_send(delivery).is_err() {
            // Queue full: the copy is lost, same as any other overflow.
            warn!(routing_key = %routing_key, "Could not requeue delivery, queue full");
        }
    }

    /// Route a delivery to the dead-letter topic.
    pub fn dead_letter(&self, delivery: Delivery) {
        error!(
            routing_key = %delivery.routing_key,
            redeliveries = delivery.redeliveries,
            "Routing message to dead-letter topic"
        );
        self.exchange.publish(DLQ_TOPIC, delivery.body);
    }

    /// The binding pattern of this queue.
    #[must_use]
    pub fn pattern(&self) -> &BindingPattern {
        &self.pattern
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.exchange.unbind(self.id);
    }
}
