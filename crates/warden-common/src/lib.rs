//! # Warden Common
//!
//! Common types, utilities, and shared abstractions for Project Warden.
//!
//! This crate provides foundational types used across all Warden subsystems:
//! - ID types (EntityId)
//! - Classification layers and masks
//! - Horizontal-plane vector helpers
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod spatial;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::spatial::*;
}

pub use prelude::*;
