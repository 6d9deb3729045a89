//! # Post Records
//!
//! The canonical post record held by the primary store, and the paginated
//! listing projection served by the cached read path.

use crate::ids::{MediaId, PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as committed to the primary store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Globally unique post identifier.
    pub id: PostId,
    /// Author of the post.
    pub user_id: UserId,
    /// Post body.
    pub content: String,
    /// Media blobs attached to this post.
    pub media_ids: Vec<MediaId>,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

/// One page of the post listing, newest first.
///
/// This is the aggregate view cached under the listing namespace; it is more
/// volatile than a single record and carries a shorter TTL on the read path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    /// Posts on this page.
    pub posts: Vec<PostRecord>,
    /// 1-based page number.
    pub current_page: usize,
    /// Total number of pages at the requested page size.
    pub total_pages: usize,
    /// Total number of posts across all pages.
    pub total_posts: usize,
}
