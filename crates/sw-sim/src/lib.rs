//! Balance-switch simulation.
//!
//! Provides:
//! - `SwitchConfig` (reference constants, YAML loading)
//! - `PointMassOnSwitch` entities wired into a lazy dependency graph
//! - `Simulation`: equilibrium angle, level status and per-robot tolerances
//!   kept consistent as robot masses and positions change

pub mod config;
pub mod error;
pub mod point_mass;
pub mod simulation;

// Internal modules
mod trial;

// Re-exports for public API
pub use config::{EquilibriumMode, SwitchConfig, SwitchConfigFile};
pub use error::{SimError, SimResult};
pub use point_mass::{CellVec2, DerivedVec2, PointMass, PointMassOnSwitch};
pub use simulation::{EntitySnapshot, Simulation, Snapshot};
pub use sw_solver::{Bound, BoundMethod, LevelBounds, ToleranceReport, ToleranceStrategy};
