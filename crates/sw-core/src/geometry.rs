//! 2D vector helpers in the plane of the switch.
//!
//! `x` points along the handle (right positive), `y` points up. Angles are in
//! radians and rotate counterclockwise.

use nalgebra::{Rotation2, Vector2};

pub type Vec2 = Vector2<f64>;

#[inline]
pub fn vec2(x: f64, y: f64) -> Vec2 {
    Vec2::new(x, y)
}

/// Counterclockwise rotation: `x' = x cos θ - y sin θ`, `y' = x sin θ + y cos θ`.
#[inline]
pub fn rotate(v: Vec2, theta: f64) -> Vec2 {
    Rotation2::new(theta) * v
}

#[inline]
pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    a + b
}

#[inline]
pub fn scale(a: Vec2, scalar: f64) -> Vec2 {
    a * scalar
}

#[inline]
pub fn magnitude(a: Vec2) -> f64 {
    a.norm()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rotation_preserves_magnitude(
            x in -100.0_f64..100.0,
            y in -100.0_f64..100.0,
            theta in -3.2_f64..3.2,
        ) {
            let v = vec2(x, y);
            let r = rotate(v, theta);
            prop_assert!((magnitude(r) - magnitude(v)).abs() < 1e-9);
        }
    }
}
