//! # Fixed-Window Rate Limiter
//!
//! Admission control applied per client identity (IP or user) before a
//! request reaches business logic.
//!
//! The counter lives in the shared [`CacheStore`], so the budget is enforced
//! across every worker and service instance that fronts the same store, not
//! per-process. Counting is a single atomic increment; the window key
//! carries the window index, so an expired-but-unswept counter from a
//! previous window can never leak requests into the current one.

use crate::keys;
use crate::store::{CacheError, CacheStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from admission control.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The identity exhausted its budget for the current window. Expected,
    /// user-facing, and never logged as an error.
    #[error("rate limit exceeded, retry after {retry_after:?}")]
    Exceeded {
        /// Time until the current window rolls over.
        retry_after: Duration,
    },
}

/// Structured rejection body the boundary layer returns alongside a
/// 429-equivalent status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRejection {
    /// Always `false`.
    pub success: bool,
    /// Human-readable rejection message.
    pub message: String,
}

impl RateLimitRejection {
    /// The canonical "Too many requests" rejection.
    #[must_use]
    pub fn too_many_requests() -> Self {
        Self {
            success: false,
            message: "Too many requests".to_owned(),
        }
    }
}

/// Fixed-window counter keyed by client identity.
pub struct FixedWindowLimiter {
    store: Arc<dyn CacheStore>,
    /// Scope label separating independent budgets (e.g. `global`, `sensitive`).
    scope: String,
    /// Requests allowed per window.
    budget: u64,
    /// Window length.
    window: Duration,
}

impl FixedWindowLimiter {
    /// Create a limiter over the shared cache store.
    pub fn new(
        store: Arc<dyn CacheStore>,
        scope: impl Into<String>,
        budget: u64,
        window: Duration,
    ) -> Self {
        Self {
            store,
            scope: scope.into(),
            budget,
            window,
        }
    }

    /// Global middleware budget: 10 requests per second.
    pub fn global(store: Arc<dyn CacheStore>) -> Self {
        Self::new(store, "global", 10, Duration::from_secs(1))
    }

    /// Budget for sensitive endpoints: 50 requests per 15 minutes.
    pub fn sensitive(store: Arc<dyn CacheStore>) -> Self {
        Self::new(store, "sensitive", 50, Duration::from_secs(15 * 60))
    }

    /// Consume one unit of budget for `identity`.
    ///
    /// # Errors
    ///
    /// `RateLimitError::Exceeded` once the identity is past its budget for
    /// the current window. The first request of the next window is admitted
    /// again.
    pub async fn consume(&self, identity: &str) -> Result<(), RateLimitError> {
        let now_millis = unix_millis();
        // Sub-millisecond windows clamp to 1 ms.
        let window_millis = (self.window.as_millis() as u64).max(1);
        let window_index = now_millis / window_millis;

        let key = keys::rate_limit_key(&self.scope, identity, window_index);
        let count = match self.store.increment(&key, self.window).await {
            Ok(count) => count,
            Err(CacheError::Unavailable { reason }) => {
                // Counter store down: admit rather than reject the world.
                warn!(%reason, identity, scope = %self.scope, "Rate limit store unavailable, admitting request");
                return Ok(());
            }
        };

        if count > self.budget {
            let elapsed_in_window = now_millis % window_millis;
            let retry_after = Duration::from_millis(window_millis - elapsed_in_window);
            debug!(
                identity,
                scope = %self.scope,
                count,
                budget = self.budget,
                "Rate limit exceeded"
            );
            return Err(RateLimitError::Exceeded { retry_after });
        }

        Ok(())
    }

    /// The configured per-window budget.
    #[must_use]
    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// The configured window length.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
