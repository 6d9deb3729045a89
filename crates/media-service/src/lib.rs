//! # Media Service
//!
//! Owns stored media blobs and their metadata records. The event-driven part
//! is the cascading delete: `post.deleted` carries the media identifiers of
//! the removed post, and the handler deletes each one. Deleting an
//! already-deleted blob is tolerated and logged, which is what makes replay
//! of the same event safe.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod handlers;
pub mod ports;

pub use handlers::PostDeletedHandler;
pub use ports::{BlobError, BlobMetadata, BlobStore, InMemoryBlobStore};
