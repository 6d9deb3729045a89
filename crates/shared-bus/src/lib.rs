//! # Shared Bus - Domain Event Propagation
//!
//! One topic exchange under a fixed name carries every domain event between
//! services. Producers publish fire-and-forget; each interested service
//! binds its own private queue, so every subscriber receives its own copy of
//! a matching event (topic fan-out).
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │ post-service │                      │search-service│
//! │              │  publish(key, body)  │              │
//! │              │ ──────┐              │              │
//! └──────────────┘       │              └──────────────┘
//!                        ▼                     ↑
//!                  ┌──────────────┐            │
//!                  │TopicExchange │ ───────────┤
//!                  │              │            ↓
//!                  └──────────────┘     ┌──────────────┐
//!                     subscribe()       │media-service │
//!                                       └──────────────┘
//! ```
//!
//! ## Delivery Contract
//!
//! - At-least-once: a consumer acknowledges only after its handler returns
//!   `Ok`; a failed handler leaves the message eligible for redelivery.
//!   Handlers must therefore be idempotent upserts/deletes by key, never
//!   increments or appends.
//! - No cross-publisher ordering: handlers must be commutative with respect
//!   to unrelated resource identifiers.
//! - Queues are private and auto-deleted with their subscription; events
//!   published while a subscriber is down are lost to it (documented gap).
//! - Messages that exhaust their redeliveries, or that fail to parse, are
//!   routed to the dead-letter topic instead of looping forever.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod consumer;
pub mod events;
pub mod exchange;
pub mod pattern;

pub use client::{Broker, BusClient, BusError, InMemoryBroker, RetryPolicy};
pub use consumer::{spawn_consumer, ConsumerPolicy, EventHandler, HandlerError};
pub use events::{DomainEvent, PostCreatedPayload, PostDeletedPayload};
pub use exchange::{Delivery, Subscription, TopicExchange};
pub use pattern::BindingPattern;

/// Fixed name of the topic exchange all services share.
pub const EXCHANGE_NAME: &str = "social_events";

/// Maximum deliveries buffered per subscriber queue before drops.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Dead-letter topic for messages that cannot be processed.
pub const DLQ_TOPIC: &str = "dlq.events";

/// Redeliveries granted to a failing message before it is dead-lettered.
pub const DEFAULT_MAX_REDELIVERIES: u32 = 5;
