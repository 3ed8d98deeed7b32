// sw-core/src/units.rs
//
// Lengths are inches and weights are pounds throughout switchsim; only angles
// cross a unit boundary (configuration files speak degrees, solvers radians).

use uom::si::angle::{degree, radian};
use uom::si::f64::Angle as UomAngle;

pub type Angle = UomAngle;

#[inline]
pub fn deg(v: f64) -> Angle {
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    Angle::new::<radian>(v)
}

#[inline]
pub fn degrees_to_radians(v: f64) -> f64 {
    deg(v).get::<radian>()
}

#[inline]
pub fn radians_to_degrees(v: f64) -> f64 {
    rad(v).get::<degree>()
}
