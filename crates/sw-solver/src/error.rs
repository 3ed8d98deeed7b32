//! Error types for solver operations.

use sw_core::SwError;
use thiserror::Error;

/// Errors from malformed solver inputs.
///
/// Degenerate physics (a bound off the handle, a zero mass) is not an error;
/// it is reported as `None`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid bracket [{lo}, {hi}]")]
    InvalidBracket { lo: f64, hi: f64 },

    #[error("Invalid solver settings: {what}")]
    InvalidSettings { what: &'static str },

    #[error("Core error: {0}")]
    Core(#[from] SwError),
}

pub type SolverResult<T> = Result<T, SolverError>;
