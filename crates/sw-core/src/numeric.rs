//! Float helpers shared by the graph and the solvers.

use crate::error::{SwError, SwResult};

pub fn ensure_finite(v: f64, what: &'static str) -> SwResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SwError::NonFinite { what, value: v })
    }
}

/// Clamp `v` into `[-limit, +limit]`. NaN passes through unchanged.
pub fn clamp_symmetric(v: f64, limit: f64) -> f64 {
    v.clamp(-limit.abs(), limit.abs())
}

/// Bit-level equality: distinguishes `0.0` from `-0.0` and treats equal NaN
/// payloads as equal.
pub fn same_bits(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}
