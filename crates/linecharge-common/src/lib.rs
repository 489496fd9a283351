//! # Line-charge Common
//!
//! Common types and shared abstractions for the line-charge flight core.
//!
//! This crate provides foundational types used by the physics and driver crates:
//! - Coordinate types (plane + height positions, map cells)
//! - ID types (FlightId)
//! - Version information for the save format
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;
