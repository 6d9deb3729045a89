//! # Search Index
//!
//! Documents plus an inverted term index, both behind one lock so an upsert
//! or removal lands atomically: a handler failure can never leave a document
//! half-linked to its terms.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{PostId, UserId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Projection of a post used for full-text lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    documents: HashMap<PostId, SearchDocument>,
    terms: HashMap<String, BTreeSet<PostId>>,
}

impl Inner {
    fn unlink_terms(&mut self, document: &SearchDocument) {
        for term in tokenize(&document.content) {
            if let Some(ids) = self.terms.get_mut(&term) {
                ids.remove(&document.post_id);
                if ids.is_empty() {
                    self.terms.remove(&term);
                }
            }
        }
    }
}

/// The derived full-text index over posts.
#[derive(Default)]
pub struct SearchIndex {
    inner: RwLock<Inner>,
}

impl SearchIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the document for a post. Replaying the same event
    /// converges on one document per `post_id`.
    pub fn upsert(&self, document: SearchDocument) {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.documents.remove(&document.post_id) {
            inner.unlink_terms(&previous);
        }
        for term in tokenize(&document.content) {
            inner
                .terms
                .entry(term)
                .or_default()
                .insert(document.post_id.clone());
        }
        debug!(post_id = %document.post_id, "Search document indexed");
        inner.documents.insert(document.post_id.clone(), document);
    }

    /// Remove the document for a post. Removing an absent document is a
    /// no-op, not an error.
    pub fn remove(&self, post_id: &PostId) {
        let mut inner = self.inner.write();
        if let Some(document) = inner.documents.remove(post_id) {
            inner.unlink_terms(&document);
            debug!(post_id = %post_id, "Search document removed");
        } else {
            debug!(post_id = %post_id, "Search document already absent");
        }
    }

    /// Documents matching every term of `query`, newest first.
    #[must_use]
    pub fn query(&self, query: &str) -> Vec<SearchDocument> {
        let terms = tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let inner = self.inner.read();
        let mut candidates: Option<BTreeSet<PostId>> = None;
        for term in &terms {
            let Some(ids) = inner.terms.get(term) else {
                return Vec::new();
            };
            candidates = Some(match candidates {
                None => ids.clone(),
                Some(existing) => existing.intersection(ids).cloned().collect(),
            });
        }

        let mut results: Vec<SearchDocument> = candidates
            .unwrap_or_default()
            .iter()
            .filter_map(|id| inner.documents.get(id).cloned())
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().documents.len()
    }

    /// Whether the index holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().documents.is_empty()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}
