//! Balance solvers for a pivoted switch.
//!
//! This crate answers two questions about a beam carrying point masses at
//! fixed switch-relative positions: at what angle does it rest
//! ([`equilibrium`]), and how far can one mass slide along the handle before
//! the resting angle leaves the level band ([`tolerance`]). Both offer an
//! exact closed form and a general bisection fallback ([`bisection`]).

pub mod bisection;
pub mod equilibrium;
pub mod error;
pub mod tolerance;

pub use bisection::{BisectionConfig, BisectionResult, bisect_boundary, bisect_sign_change};
pub use equilibrium::{
    EquilibriumStrategy, MassPoint, Moments, absolute_position, bisection_angle,
    closed_form_angle, is_level, net_torque_at, torque,
};
pub use error::{SolverError, SolverResult};
pub use tolerance::{
    Bound, BoundMethod, LevelBounds, ToleranceReport, ToleranceStrategy, closed_form_bounds,
    closed_form_position, settle_on_level_side, solve_tolerance,
};
