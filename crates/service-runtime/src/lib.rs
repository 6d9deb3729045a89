//! # Service Runtime
//!
//! Process composition for the social services: builds the broker, bus
//! client, shared cache, and the three services, then runs their consumer
//! tasks until shutdown.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod telemetry;
pub mod wiring;

pub use config::{BusConfig, CacheConfig, RateLimitConfig, RuntimeConfig};
pub use wiring::{Runtime, RuntimeError};
