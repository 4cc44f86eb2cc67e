use crate::euclid::{Point2D, Vector2D};

pub fn rotate<U>(a: Vector2D<f64, U>, angle: f64) -> Vector2D<f64, U> {
    let cos = angle.cos();
    let sin = angle.sin();
    let x = cos * a.x - sin * a.y;
    let y = sin * a.x + cos * a.y;
    Vector2D::new(x, y)
}

pub fn perp<U>(a: Vector2D<f64, U>) -> Vector2D<f64, U> {
    Vector2D::new(-a.y, a.x)
}

pub fn interp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

pub fn dist<U>(a: Point2D<f64, U>, b: Point2D<f64, U>) -> f64 {
    (b - a).length()
}

/// Angle of the segment `a -> b`, in radians.
pub fn angle_to<U>(b: Point2D<f64, U>, a: Point2D<f64, U>) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Normalize an angle into `[0, 2*PI)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * std::f64::consts::PI;
    angle.rem_euclid(two_pi)
}
