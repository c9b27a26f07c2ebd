use crate::foundation::core::Vec2;
use crate::style::color::Color;

/// Interpolation contract for animatable value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    ///
    /// Implementations must return exactly `a` at `t == 0` and exactly `b` at `t == 1`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    if t >= 1.0 {
        return b;
    }
    a + (b - a) * t
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        lerp_f64(*a, *b, t)
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(lerp_f64(a.x, b.x, t), lerp_f64(a.y, b.y, t))
    }
}

impl Lerp for Color {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Color::rgba(
            lerp_f64(a.r, b.r, t),
            lerp_f64(a.g, b.g, t),
            lerp_f64(a.b, b.b, t),
            lerp_f64(a.a, b.a, t),
        )
    }
}
