//! # Shared Cache - Read-Through Cache & Admission Control
//!
//! Key/value store with TTL used two ways:
//!
//! - **Read-through caching**: expensive reads check the cache first, fall
//!   back to the primary store on a miss, and populate the cache with a
//!   bounded TTL. Cache unavailability degrades freshness, never correctness.
//! - **Admission control**: fixed-window rate-limit counters live in the same
//!   store, so the budget is shared across every worker that fronts the
//!   business logic.
//!
//! ## Key Discipline
//!
//! Every cache key is built by [`keys`]. Producer-side invalidation and
//! consumer-side population must agree on the exact key text; ad-hoc
//! `format!` calls at the call sites are how the two drift apart.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod keys;
pub mod rate_limit;
pub mod store;

pub use rate_limit::{FixedWindowLimiter, RateLimitError, RateLimitRejection};
pub use store::{CacheError, CacheStore, InMemoryCacheStore};

use std::time::Duration;

/// TTL for cached single-resource reads (immutable-ish records).
pub const POST_TTL: Duration = Duration::from_secs(3600);

/// TTL for cached paginated listings (volatile aggregate views).
pub const LISTING_TTL: Duration = Duration::from_secs(300);

/// How often the in-memory store sweeps out expired entries.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(10);
