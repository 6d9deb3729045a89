//! # Consumer Runtime
//!
//! One message-handling task per subscription. Acknowledgment is explicit
//! and happens only after the handler returns `Ok`; a failed handler leaves
//! the message unacknowledged and it is redelivered, so every handler effect
//! must be an idempotent upsert-by-key or delete-by-key.
//!
//! Messages that keep failing are dead-lettered after a bounded number of
//! redeliveries, as are payloads that cannot be parsed at all - a poison
//! message must never pin its queue.

use crate::events::DomainEvent;
use crate::exchange::Subscription;
use crate::DEFAULT_MAX_REDELIVERIES;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A consumer handler raised an error while applying its effect. The message
/// stays unacknowledged and becomes eligible for redelivery.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Describe a failed effect.
    pub fn effect(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A per-service event handler bound to one subscription.
///
/// Handlers receive every event their binding pattern matches and must
/// ignore variants that are not theirs. Effects must be idempotent and
/// commutative across unrelated resource identifiers: deliveries can repeat
/// and cross-key ordering is not guaranteed.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handler name, used in logs and redelivery accounting.
    fn name(&self) -> &'static str;

    /// Apply the effect for one event. `Ok` acknowledges the message.
    async fn handle(&self, event: &DomainEvent) -> Result<(), HandlerError>;
}

/// Redelivery policy for one consumer task.
#[derive(Debug, Clone)]
pub struct ConsumerPolicy {
    /// Redeliveries granted before the message is dead-lettered.
    pub max_redeliveries: u32,
}

impl Default for ConsumerPolicy {
    fn default() -> Self {
        Self {
            max_redeliveries: DEFAULT_MAX_REDELIVERIES,
        }
    }
}

/// Spawn the message-handling task for one subscription.
///
/// The task runs until the subscription's queue is torn down (or the handle
/// is aborted at shutdown).
pub fn spawn_consumer(
    mut subscription: Subscription,
    handler: Arc<dyn EventHandler>,
    policy: ConsumerPolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            handler = handler.name(),
            pattern = subscription.pattern().as_str(),
            "Consumer started"
        );

        while let Some(delivery) = subscription.recv().await {
            let event = match DomainEvent::decode(&delivery.routing_key, &delivery.body) {
                Ok(event) => event,
                Err(err) => {
                    warn!(
                        handler = handler.name(),
                        routing_key = %delivery.routing_key,
                        error = %err,
                        "Undecodable message, dead-lettering"
                    );
                    subscription.dead_letter(delivery);
                    continue;
                }
            };

            match handler.handle(&event).await {
                Ok(()) => {
                    debug!(
                        handler = handler.name(),
                        routing_key = %delivery.routing_key,
                        "Message acknowledged"
                    );
                }
                Err(err) if delivery.redeliveries < policy.max_redeliveries => {
                    warn!(
                        handler = handler.name(),
                        routing_key = %delivery.routing_key,
                        redeliveries = delivery.redeliveries,
                        error = %err,
                        "Handler failed, message left unacknowledged"
                    );
                    subscription.requeue(delivery);
                }
                Err(err) => {
                    warn!(
                        handler = handler.name(),
                        routing_key = %delivery.routing_key,
                        error = %err,
                        "Handler failed with redeliveries exhausted"
                    );
                    subscription.dead_letter(delivery);
                }
            }
        }

        info!(handler = handler.name(), "Consumer stopped");
    })
}
