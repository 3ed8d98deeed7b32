//! sw-core: stable foundation for switchsim.
//!
//! Contains:
//! - units (uom angle types + degree/radian conversion)
//! - numeric (finiteness checks, clamping, bit comparison)
//! - ids (compact IDs for dependency-graph slots)
//! - geometry (2D vectors on the switch plane)
//! - error (shared error types)

pub mod error;
pub mod geometry;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SwError, SwResult};
pub use geometry::Vec2;
pub use ids::*;
pub use numeric::*;
