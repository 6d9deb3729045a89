//! # Post Service
//!
//! The mutation side of the post lifecycle. Every mutation follows the same
//! best-effort sequence: commit to the primary store, publish the domain
//! event, invalidate dependent cache entries. The steps are not a
//! transaction - a crash between commit and publish leaves the event unsent,
//! and the system accepts that eventual-consistency window rather than
//! blocking the write path on the bus.
//!
//! Reads are read-through: cache first, primary store on a miss, cache
//! populated with a bounded TTL.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod ports;
pub mod service;

pub use error::PostError;
pub use ports::{InMemoryPostStore, PostStore, StoreError};
pub use service::PostService;
