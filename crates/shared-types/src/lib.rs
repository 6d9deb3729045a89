//! # Shared Types Crate
//!
//! Domain identifiers and records shared across services.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-service types are defined here.
//! - **Self-Contained Payloads**: Event payloads built from these types must
//!   carry everything a consumer needs; consumers never call back into the
//!   producing service.

pub mod ids;
pub mod post;

pub use ids::{MediaId, PostId, UserId};
pub use post::{PostPage, PostRecord};
