//! # Search Service
//!
//! Maintains the search projection of posts. The index is owned exclusively
//! by this service and written only by its event handlers: `post.created`
//! upserts a document, `post.deleted` removes one. Both effects are
//! idempotent by `post_id`, so duplicate and re-ordered deliveries converge
//! on the same index state.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod handlers;
pub mod index;

pub use handlers::{PostCreatedHandler, PostDeletedHandler};
pub use index::{SearchDocument, SearchIndex};
