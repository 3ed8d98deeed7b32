//! Resting angle of the switch.
//!
//! Sign conventions: angles are counterclockwise, the pivot sits at
//! `(0, pivot_height)`, and a point mass at absolute `x` exerts torque
//! `-mass * x` about the pivot.
//!
//! The closed form balances the center of mass computed from switch-relative
//! coordinates: `angle = atan(com_x / com_y)`. Rotating every point by the
//! same angle rotates their center of mass too, so the net torque
//! `-M (com_x cos θ - com_y sin θ)` vanishes exactly there; the relative
//! coordinates never need to be re-rotated to find the angle.

use sw_core::geometry::{add, rotate, vec2};
use sw_core::{Vec2, clamp_symmetric};
use tracing::debug;

use crate::bisection::{BisectionConfig, BisectionResult, bisect_sign_change};
use crate::error::SolverResult;

/// How the equilibrium angle is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EquilibriumStrategy {
    /// `atan(com_x / com_y)`, clamped (default).
    #[default]
    ClosedForm,
    /// Bisection on the sign of net torque over `[-max_angle, max_angle]`.
    Bisection,
}

/// A point mass at a switch-relative position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassPoint {
    pub mass: f64,
    pub relative: Vec2,
}

impl MassPoint {
    pub fn new(mass: f64, x: f64, y: f64) -> Self {
        Self {
            mass,
            relative: vec2(x, y),
        }
    }
}

/// Mass-weighted sums over switch-relative coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    pub total_mass: f64,
    pub moment_x: f64,
    pub moment_y: f64,
}

impl Moments {
    pub fn of(points: &[MassPoint]) -> Self {
        points.iter().fold(Self::default(), |acc, p| Self {
            total_mass: acc.total_mass + p.mass,
            moment_x: acc.moment_x + p.mass * p.relative.x,
            moment_y: acc.moment_y + p.mass * p.relative.y,
        })
    }

    /// Center of mass, `None` when there is no mass at all.
    pub fn center(&self) -> Option<Vec2> {
        (self.total_mass != 0.0)
            .then(|| vec2(self.moment_x / self.total_mass, self.moment_y / self.total_mass))
    }
}

/// `rotate(relative, angle) + (0, pivot_height)`.
pub fn absolute_position(relative: Vec2, angle: f64, pivot_height: f64) -> Vec2 {
    add(rotate(relative, angle), vec2(0.0, pivot_height))
}

/// Torque of a point mass about the pivot.
pub fn torque(mass: f64, absolute_x: f64) -> f64 {
    -mass * absolute_x
}

/// Net torque with every point rotated to `angle`.
///
/// The pivot height only shifts `y`, so it does not enter.
pub fn net_torque_at(points: &[MassPoint], angle: f64) -> f64 {
    points
        .iter()
        .map(|p| torque(p.mass, rotate(p.relative, angle).x))
        .sum()
}

/// Closed-form equilibrium angle clamped to `[-max_angle, max_angle]`.
///
/// A center of mass exactly on the pivot (`0 / 0`) balances at any angle;
/// it is reported as level.
pub fn closed_form_angle(com_x: f64, com_y: f64, max_angle: f64) -> f64 {
    let ratio = com_x / com_y;
    if ratio.is_nan() {
        return 0.0;
    }
    clamp_symmetric(ratio.atan(), max_angle)
}

/// Equilibrium angle by bisection on net torque.
///
/// Requires net torque to be monotonic in angle over the bracket. That holds
/// when the center of mass hangs below the pivot, and is not checked.
pub fn bisection_angle(
    points: &[MassPoint],
    max_angle: f64,
    config: &BisectionConfig,
) -> SolverResult<BisectionResult> {
    let limit = max_angle.abs();
    let result = bisect_sign_change(-limit, limit, config, |angle| {
        net_torque_at(points, angle)
    })?;
    debug!(
        angle = result.value,
        iterations = result.iterations,
        width = result.width,
        "equilibrium bisection finished"
    );
    Ok(result)
}

/// `|angle| <= threshold`.
pub fn is_level(angle: f64, threshold: f64) -> bool {
    angle.abs() <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_ANGLE: f64 = 14.5 * std::f64::consts::PI / 180.0;

    fn counterweight() -> MassPoint {
        MassPoint::new(93.0, 0.0, -26.0)
    }

    #[test]
    fn moments_and_center() {
        let points = [counterweight(), MassPoint::new(100.0, 10.0, -48.375)];
        let m = Moments::of(&points);
        assert_eq!(m.total_mass, 193.0);
        assert_eq!(m.moment_x, 1000.0);
        assert_eq!(m.moment_y, 93.0 * -26.0 + 100.0 * -48.375);
        let c = m.center().unwrap();
        assert!((c.x - 1000.0 / 193.0).abs() < 1e-12);
        assert!(Moments::default().center().is_none());
    }

    #[test]
    fn absolute_position_adds_pivot_height() {
        let p = absolute_position(vec2(0.0, -26.0), 0.0, 111.375);
        assert_eq!(p, vec2(0.0, 85.375));
    }

    #[test]
    fn torque_sign() {
        // weight right of the pivot turns the beam clockwise
        assert_eq!(torque(10.0, 2.0), -20.0);
        assert_eq!(torque(0.0, 2.0), -0.0);
    }

    #[test]
    fn closed_form_balanced_beam_is_zero() {
        assert_eq!(closed_form_angle(0.0, -26.0, MAX_ANGLE), 0.0);
        assert_eq!(closed_form_angle(0.0, 0.0, MAX_ANGLE), 0.0);
    }

    #[test]
    fn closed_form_clamps() {
        assert_eq!(closed_form_angle(30.0, -37.0, MAX_ANGLE), -MAX_ANGLE);
        assert_eq!(closed_form_angle(-30.0, -37.0, MAX_ANGLE), MAX_ANGLE);
        assert_eq!(closed_form_angle(1.0, 0.0, MAX_ANGLE), MAX_ANGLE);
    }

    #[test]
    fn closed_form_zeroes_net_torque() {
        let points = [counterweight(), MassPoint::new(20.0, 5.0, -48.375)];
        let m = Moments::of(&points);
        let c = m.center().unwrap();
        let angle = closed_form_angle(c.x, c.y, MAX_ANGLE);
        assert!(angle.abs() < MAX_ANGLE);
        assert!(net_torque_at(&points, angle).abs() < 1e-9);
    }

    #[test]
    fn bisection_agrees_with_closed_form() {
        let cfg = BisectionConfig::default();
        let points = [counterweight(), MassPoint::new(20.0, 5.0, -48.375)];
        let c = Moments::of(&points).center().unwrap();
        let exact = closed_form_angle(c.x, c.y, MAX_ANGLE);
        let result = bisection_angle(&points, MAX_ANGLE, &cfg).unwrap();
        assert!((result.value - exact).abs() < cfg.precision);
    }

    #[test]
    fn bisection_pins_to_stop() {
        let cfg = BisectionConfig::default();
        let points = [counterweight(), MassPoint::new(100.0, 57.0, -48.375)];
        let result = bisection_angle(&points, MAX_ANGLE, &cfg).unwrap();
        assert_eq!(result.value, -MAX_ANGLE);
    }

    #[test]
    fn bisection_balanced_beam() {
        let cfg = BisectionConfig::default();
        let result = bisection_angle(&[counterweight()], MAX_ANGLE, &cfg).unwrap();
        assert_eq!(result.value, 0.0);
    }

    #[test]
    fn level_is_inclusive() {
        assert!(is_level(0.1, 0.1));
        assert!(is_level(-0.1, 0.1));
        assert!(!is_level(0.100001, 0.1));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn angle_stays_within_stops(
            robot_mass in 0.0_f64..120.0,
            robot_x in -57.0_f64..57.0,
            max_angle in 0.01_f64..1.0,
        ) {
            let points = [
                MassPoint::new(93.0, 0.0, -26.0),
                MassPoint::new(robot_mass, robot_x, -48.375),
            ];
            let c = Moments::of(&points).center().unwrap();
            let angle = closed_form_angle(c.x, c.y, max_angle);
            prop_assert!(angle.abs() <= max_angle);

            let cfg = BisectionConfig::default();
            let bisected = bisection_angle(&points, max_angle, &cfg).unwrap().value;
            prop_assert!(bisected.abs() <= max_angle);
            prop_assert!((bisected - angle).abs() < 1e-5);
        }
    }
}
