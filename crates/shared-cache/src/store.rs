//! # Cache Store
//!
//! The `CacheStore` port and its in-memory implementation.
//!
//! All cache operations are last-write-wins and safe under concurrent
//! writers; no caller may assume exclusive ownership of a key. Failures are
//! surfaced as `CacheError` and every caller is expected to degrade (fall
//! back to the primary store, or skip invalidation with a warning) rather
//! than fail the request.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Errors from cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache backend cannot be reached. Non-fatal everywhere: reads
    /// fall back to the primary store, writes skip with a warning.
    #[error("cache unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Abstract interface for the shared key/value cache.
///
/// The in-memory implementation below is the one shipped here; a distributed
/// deployment would put Redis or similar behind the same port.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the value for a key, if present and not expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a value with a bounded time-to-live.
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration)
        -> Result<(), CacheError>;

    /// Delete keys. Deleting an absent key is a no-op.
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;

    /// All live keys matching a glob pattern (`*` matches any run of
    /// characters).
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    /// Delete every key matching a glob pattern; returns how many went.
    async fn delete_matching(&self, pattern: &str) -> Result<usize, CacheError> {
        let keys = self.keys_matching(pattern).await?;
        let count = keys.len();
        self.delete(&keys).await?;
        Ok(count)
    }

    /// Atomically increment a counter key, creating it with the given TTL on
    /// first touch within the window. Returns the post-increment count.
    ///
    /// The TTL is set only when the counter is created, so the counter
    /// expires at the end of its window regardless of later increments.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError>;
}

/// Match `text` against a glob pattern where `*` matches any run of
/// characters (including none).
#[must_use]
pub fn glob_match(pattern: &str, text: &str) -> bool {
    // Byte-wise so keys containing multibyte characters cannot split a
    // comparison mid-character.
    fn matches(pattern: &[u8], text: &[u8]) -> bool {
        match pattern.first() {
            None => text.is_empty(),
            Some(b'*') => (0..=text.len()).any(|i| matches(&pattern[1..], &text[i..])),
            Some(&c) => text.first() == Some(&c) && matches(&pattern[1..], &text[1..]),
        }
    }
    matches(pattern.as_bytes(), text.as_bytes())
}

/// A cached value with its expiry deadline.
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// In-memory implementation of the shared cache.
///
/// Expired entries are treated as absent on read and swept out by
/// [`purge_expired`](Self::purge_expired), which the runtime calls on an
/// interval.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl InMemoryCacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the store holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove expired entries. Returns how many were swept.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let swept = before - self.entries.len();
        if swept > 0 {
            debug!(swept, "Purged expired cache entries");
        }
        swept
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Ok(Some(entry.value.clone()));
            }
        }
        // Expired entries are dropped on first read past their deadline.
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        Ok(self
            .entries
            .iter()
            .filter(|entry| !entry.is_expired(now) && glob_match(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<u64, CacheError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_owned()).or_insert_with(|| CacheEntry {
            value: 0u64.to_be_bytes().to_vec(),
            expires_at: now + ttl,
        });
        if entry.is_expired(now) {
            entry.value = 0u64.to_be_bytes().to_vec();
            entry.expires_at = now + ttl;
        }
        let current = entry
            .value
            .as_slice()
            .try_into()
            .map(u64::from_be_bytes)
            .unwrap_or(0);
        let next = current + 1;
        entry.value = next.to_be_bytes().to_vec();
        Ok(next)
    }
}
