//! # Post Service Errors

use crate::ports::StoreError;
use thiserror::Error;

/// Errors surfaced by the post service's operations.
#[derive(Debug, Error)]
pub enum PostError {
    /// No post with the requested id (or not owned by the requesting user).
    #[error("post not found")]
    NotFound,

    /// The primary store failed; the mutation did not commit.
    #[error(transparent)]
    Store(#[from] StoreError),
}
