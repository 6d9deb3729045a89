//! # Canonical Cache Keys
//!
//! The one place cache key text is constructed. Both the producer paths
//! (invalidation) and the read paths (population) go through these
//! functions, so a key written by one side is always found by the other.
//!
//! Namespace conventions:
//!
//! - `post:<id>` — a single post record
//! - `posts:<page>` — one page of the post listing
//! - `ratelimit:<scope>:<identity>:<window>` — admission-control counters

use shared_types::PostId;

/// Key for a single post record.
#[must_use]
pub fn post_key(id: &PostId) -> String {
    format!("post:{id}")
}

/// Key for one page of the post listing.
#[must_use]
pub fn post_page_key(page: usize) -> String {
    format!("posts:{page}")
}

/// Pattern matching every listing page key.
///
/// Any mutation of any post invalidates all listing pages; pages shift when
/// a post is inserted or removed, so per-page invalidation is not possible.
#[must_use]
pub fn post_listing_pattern() -> &'static str {
    "posts:*"
}

/// Key for a rate-limit counter window.
#[must_use]
pub fn rate_limit_key(scope: &str, identity: &str, window: u64) -> String {
    format!("ratelimit:{scope}:{identity}:{window}")
}
