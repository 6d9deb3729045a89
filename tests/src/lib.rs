//! # Social Fabric Test Suite
//!
//! Unified test crate for cross-service flows. Every test here runs against
//! a fully wired [`service_runtime::Runtime`] or the real shared
//! infrastructure; single-crate behavior lives in the unit tests of the
//! crate it belongs to.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Harness helpers shared by all suites
//! └── integration/
//!     ├── event_flows.rs        # Produce → bus → consume choreography
//!     ├── cache_consistency.rs  # Read-through, invalidation, TTL, GC
//!     ├── reliability.rs        # Redelivery and dead-letter semantics
//!     └── rate_limiting.rs      # Shared-store admission control
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All cross-service tests
//! cargo test -p social-tests
//!
//! # By suite
//! cargo test -p social-tests integration::event_flows::
//! cargo test -p social-tests integration::cache_consistency::
//! ```

#![allow(dead_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod support;
