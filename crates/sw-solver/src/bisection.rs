//! Bracketing bisection with bounded iteration.

use crate::error::{SolverError, SolverResult};

/// Bisection configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BisectionConfig {
    /// Stop once the bracket is narrower than this
    pub precision: f64,
    /// Hard cap on midpoint evaluations
    pub max_iterations: usize,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            precision: 1e-6,
            max_iterations: 200,
        }
    }
}

impl BisectionConfig {
    pub fn with_precision(precision: f64) -> Self {
        Self {
            precision,
            ..Self::default()
        }
    }

    fn validate(&self) -> SolverResult<()> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(SolverError::InvalidSettings {
                what: "precision must be positive and finite",
            });
        }
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidSettings {
                what: "max_iterations must be positive",
            });
        }
        Ok(())
    }
}

/// Bisection result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BisectionResult {
    /// Reported abscissa
    pub value: f64,
    /// Final bracket width
    pub width: f64,
    /// Number of midpoint evaluations
    pub iterations: usize,
}

fn check_bracket(a: f64, b: f64) -> SolverResult<()> {
    if a.is_finite() && b.is_finite() {
        Ok(())
    } else {
        Err(SolverError::InvalidBracket { lo: a, hi: b })
    }
}

/// Find the edge of the region where `inside` holds.
///
/// `inside_end` must satisfy the predicate. If `outside_end` also does, the
/// whole bracket is inside and `outside_end` is returned as is. Otherwise the
/// bracket is halved until narrower than the precision and the end that
/// satisfies the predicate is returned, so the reported value is always on the
/// inside of the boundary. Works with either end on either side.
pub fn bisect_boundary<P>(
    inside_end: f64,
    outside_end: f64,
    config: &BisectionConfig,
    mut inside: P,
) -> SolverResult<BisectionResult>
where
    P: FnMut(f64) -> bool,
{
    config.validate()?;
    check_bracket(inside_end, outside_end)?;

    if inside(outside_end) {
        return Ok(BisectionResult {
            value: outside_end,
            width: 0.0,
            iterations: 1,
        });
    }

    let mut keep = inside_end;
    let mut reject = outside_end;
    let mut iterations = 1;
    while (reject - keep).abs() >= config.precision && iterations < config.max_iterations {
        let mid = 0.5 * (keep + reject);
        if inside(mid) {
            keep = mid;
        } else {
            reject = mid;
        }
        iterations += 1;
    }

    Ok(BisectionResult {
        value: keep,
        width: (reject - keep).abs(),
        iterations,
    })
}

/// Find a zero of `f` on `[lo, hi]` by sign change.
///
/// Assumes `f` is monotonic on the bracket. If both ends have the same sign
/// there is no interior zero and the end with the smaller magnitude is
/// returned, which for a monotonic function is the end nearest the zero.
/// A function that is zero at both ends is taken to be zero throughout and
/// the midpoint is returned.
pub fn bisect_sign_change<F>(
    lo: f64,
    hi: f64,
    config: &BisectionConfig,
    mut f: F,
) -> SolverResult<BisectionResult>
where
    F: FnMut(f64) -> f64,
{
    config.validate()?;
    check_bracket(lo, hi)?;
    if lo > hi {
        return Err(SolverError::InvalidBracket { lo, hi });
    }

    let (mut lo, mut hi) = (lo, hi);
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    let mut iterations = 2;

    if f_lo == 0.0 && f_hi == 0.0 {
        return Ok(BisectionResult {
            value: 0.5 * (lo + hi),
            width: hi - lo,
            iterations,
        });
    }
    if f_lo == 0.0 {
        return Ok(BisectionResult {
            value: lo,
            width: 0.0,
            iterations,
        });
    }
    if f_hi == 0.0 {
        return Ok(BisectionResult {
            value: hi,
            width: 0.0,
            iterations,
        });
    }
    if f_lo.signum() == f_hi.signum() {
        let value = if f_lo.abs() <= f_hi.abs() { lo } else { hi };
        return Ok(BisectionResult {
            value,
            width: 0.0,
            iterations,
        });
    }

    while hi - lo >= config.precision && iterations < config.max_iterations {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        iterations += 1;
        if f_mid == 0.0 {
            return Ok(BisectionResult {
                value: mid,
                width: 0.0,
                iterations,
            });
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Ok(BisectionResult {
        value: 0.5 * (lo + hi),
        width: hi - lo,
        iterations,
    })
}
