//! How far one mass can slide along the handle while the switch stays level.
//!
//! With every other mass fixed, the torque balance at a target angle θ is
//! linear in the position `x_i` of the sliding mass:
//!
//! ```text
//! x_i = ((Σ_j m_j y_j) tan θ - Σ_{j≠i} m_j x_j) / m_i
//! ```
//!
//! θ = ±level_threshold gives the two edges of the level band, θ = 0 the
//! ideal position. When that closed form is unavailable (zero mass, an edge
//! off the handle) the edge is found by probing: move the mass, read the
//! level flag, bisect.

use tracing::debug;

use crate::bisection::{BisectionConfig, bisect_boundary};
use crate::equilibrium::MassPoint;
use crate::error::SolverResult;

/// Nudges allowed when settling a closed-form edge onto the level side.
const MAX_SETTLE_STEPS: usize = 16;

/// Closed-form positions for one movable mass; `None` is undefined.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LevelBounds {
    pub min: Option<f64>,
    pub zero: Option<f64>,
    pub max: Option<f64>,
}

/// Which strategy produced a bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundMethod {
    ClosedForm,
    Bisection,
}

/// One edge of the level interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    pub position: f64,
    pub method: BoundMethod,
}

/// How tolerance edges are located.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToleranceStrategy {
    /// Closed form, bisection only where the closed form is undefined.
    #[default]
    ClosedFormFirst,
    /// Always bisect.
    Bisection,
}

/// Tolerance of one movable mass.
///
/// `minus`/`plus` are `None` when the switch is not level to begin with.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ToleranceReport {
    pub minus: Option<f64>,
    pub plus: Option<f64>,
    pub ideal_x: Option<f64>,
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

fn raw_position(points: &[MassPoint], index: usize, target_angle: f64) -> Option<f64> {
    let target = points.get(index)?;
    if target.mass == 0.0 {
        return None;
    }
    let moment_y: f64 = points.iter().map(|p| p.mass * p.relative.y).sum();
    let others_x: f64 = points
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != index)
        .map(|(_, p)| p.mass * p.relative.x)
        .sum();
    let x = (moment_y * target_angle.tan() - others_x) / target.mass;
    x.is_finite().then_some(x)
}

fn on_handle(x: Option<f64>, half_length: f64) -> Option<f64> {
    x.filter(|x| x.abs() <= half_length)
}

/// Position of mass `index` that puts the equilibrium at `target_angle`.
///
/// `None` if the mass is zero, the result is not finite, or it lies beyond
/// `half_length` from the pivot.
pub fn closed_form_position(
    points: &[MassPoint],
    index: usize,
    target_angle: f64,
    half_length: f64,
) -> Option<f64> {
    on_handle(raw_position(points, index, target_angle), half_length)
}

/// Level-band edges and ideal position of mass `index`.
pub fn closed_form_bounds(
    points: &[MassPoint],
    index: usize,
    threshold: f64,
    half_length: f64,
) -> LevelBounds {
    let zero = closed_form_position(points, index, 0.0, half_length);
    let (min, max) = match (
        raw_position(points, index, threshold),
        raw_position(points, index, -threshold),
    ) {
        (Some(a), Some(b)) => (Some(a.min(b)), Some(a.max(b))),
        _ => (None, None),
    };
    LevelBounds {
        min: on_handle(min, half_length),
        zero,
        max: on_handle(max, half_length),
    }
}

/// Move `bound` toward `toward` in tiny steps until `level_at` accepts it.
///
/// A closed-form edge sits on the boundary up to rounding, so it can read
/// one ulp outside the band. `None` if a handful of steps does not settle it.
pub fn settle_on_level_side<P>(bound: f64, toward: f64, level_at: &mut P) -> Option<f64>
where
    P: FnMut(f64) -> bool,
{
    let direction = (toward - bound).signum();
    let step = 4.0 * f64::EPSILON * bound.abs().max(1.0);
    let mut candidate = bound;
    for _ in 0..MAX_SETTLE_STEPS {
        if level_at(candidate) {
            return Some(candidate);
        }
        if candidate == toward {
            return None;
        }
        let next = candidate + direction * step;
        candidate = if (toward - next) * direction <= 0.0 {
            toward
        } else {
            next
        };
    }
    None
}

/// Largest span not above `span` for which `current + direction * span`
/// still reads level.
///
/// Subtracting an edge from `current` and adding it back can land one ulp
/// past the edge, so the reported span is checked on its own. Falls back to
/// zero, where `current` is known to be level.
fn settle_span<P>(current: f64, span: f64, direction: f64, level_at: &mut P) -> f64
where
    P: FnMut(f64) -> bool,
{
    let mut span = span.max(0.0);
    for _ in 0..MAX_SETTLE_STEPS {
        if span == 0.0 || level_at(current + direction * span) {
            return span;
        }
        let step = 4.0 * f64::EPSILON * current.abs().max(span).max(1.0);
        span = (span - step).max(0.0);
    }
    debug!(current, span, "tolerance span did not settle");
    0.0
}

fn resolve_edge<P>(
    current: f64,
    closed: Option<f64>,
    handle_end: f64,
    strategy: ToleranceStrategy,
    config: &BisectionConfig,
    level_at: &mut P,
) -> SolverResult<Bound>
where
    P: FnMut(f64) -> bool,
{
    if strategy == ToleranceStrategy::ClosedFormFirst {
        if let Some(position) =
            closed.and_then(|bound| settle_on_level_side(bound, current, &mut *level_at))
        {
            return Ok(Bound {
                position,
                method: BoundMethod::ClosedForm,
            });
        }
        debug!(current, handle_end, "closed form undefined, bisecting");
    }

    let result = bisect_boundary(current, handle_end, config, &mut *level_at)?;
    debug!(
        edge = result.value,
        iterations = result.iterations,
        "tolerance bisection finished"
    );
    Ok(Bound {
        position: result.value,
        method: BoundMethod::Bisection,
    })
}

/// Tolerance interval of one movable mass.
///
/// `level_at(x)` places the mass at `x` and reports whether the switch is
/// level; the caller owns restoring the original position afterwards.
/// `closed` carries the closed-form edges; edges on the wrong side of
/// `current` are treated as undefined.
pub fn solve_tolerance<P>(
    current: f64,
    closed: &LevelBounds,
    half_length: f64,
    strategy: ToleranceStrategy,
    config: &BisectionConfig,
    mut level_at: P,
) -> SolverResult<ToleranceReport>
where
    P: FnMut(f64) -> bool,
{
    let ideal_x = closed.zero;
    if !level_at(current) {
        return Ok(ToleranceReport {
            ideal_x,
            ..ToleranceReport::default()
        });
    }

    let half = half_length.abs();
    let lower = resolve_edge(
        current,
        closed.min.filter(|b| *b <= current),
        -half,
        strategy,
        config,
        &mut level_at,
    )?;
    let upper = resolve_edge(
        current,
        closed.max.filter(|b| *b >= current),
        half,
        strategy,
        config,
        &mut level_at,
    )?;

    let minus = settle_span(current, current - lower.position, -1.0, &mut level_at);
    let plus = settle_span(current, upper.position - current, 1.0, &mut level_at);
    Ok(ToleranceReport {
        minus: Some(minus),
        plus: Some(plus),
        ideal_x,
        lower: Some(Bound {
            position: current - minus,
            ..lower
        }),
        upper: Some(Bound {
            position: current + plus,
            ..upper
        }),
    })
}
