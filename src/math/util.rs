use super::{Point2d, Vector2d};
use cgmath::prelude::*;

/// Rotates a vector 90 degrees anti-clockwise, i.e. to the left of the direction of travel.
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Returns the unit vector pointing from `from` to `to`,
/// or the zero vector if the two points coincide.
pub fn direction(from: Point2d, to: Point2d) -> Vector2d {
    let v = to - from;
    let mag = v.magnitude();
    if mag > f64::EPSILON {
        v / mag
    } else {
        Vector2d::zero()
    }
}
