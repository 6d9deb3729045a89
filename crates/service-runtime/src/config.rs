//! # Runtime Configuration
//!
//! Unified configuration for the bus, cache, and admission control, with
//! sane defaults and environment overrides for the values operators
//! actually change.

use shared_bus::RetryPolicy;
use std::time::Duration;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Event bus configuration.
    pub bus: BusConfig,
    /// Cache configuration.
    pub cache: CacheConfig,
    /// Admission control configuration.
    pub rate_limit: RateLimitConfig,
}

impl RuntimeConfig {
    /// Defaults with environment overrides applied.
    ///
    /// - `SOCIAL_EXCHANGE_NAME`: exchange name
    /// - `SOCIAL_MAX_REDELIVERIES`: redeliveries before dead-lettering
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = std::env::var("SOCIAL_EXCHANGE_NAME") {
            if !name.is_empty() {
                config.bus.exchange_name = name;
            }
        }
        if let Ok(max) = std::env::var("SOCIAL_MAX_REDELIVERIES") {
            if let Ok(max) = max.parse() {
                config.bus.max_redeliveries = max;
            }
        }
        config
    }
}

/// Event bus configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Name of the shared topic exchange.
    pub exchange_name: String,
    /// Deliveries buffered per subscriber queue.
    pub queue_capacity: usize,
    /// Redeliveries before a failing message is dead-lettered.
    pub max_redeliveries: u32,
    /// Startup connect retry policy.
    pub connect: RetryPolicy,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            exchange_name: shared_bus::EXCHANGE_NAME.to_owned(),
            queue_capacity: shared_bus::DEFAULT_QUEUE_CAPACITY,
            max_redeliveries: shared_bus::DEFAULT_MAX_REDELIVERIES,
            connect: RetryPolicy::default(),
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for single-resource reads.
    pub post_ttl: Duration,
    /// TTL for paginated listings.
    pub listing_ttl: Duration,
    /// Interval of the expired-entry sweep.
    pub gc_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            post_ttl: shared_cache::POST_TTL,
            listing_ttl: shared_cache::LISTING_TTL,
            gc_interval: shared_cache::DEFAULT_GC_INTERVAL,
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Global middleware budget per window.
    pub global_budget: u64,
    /// Global window length.
    pub global_window: Duration,
    /// Budget for sensitive endpoints per window.
    pub sensitive_budget: u64,
    /// Sensitive window length.
    pub sensitive_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_budget: 10,
            global_window: Duration::from_secs(1),
            sensitive_budget: 50,
            sensitive_window: Duration::from_secs(15 * 60),
        }
    }
}
