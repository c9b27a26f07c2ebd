use std::f64::consts::PI;

/// Progress curve of a tween.
///
/// Every curve maps `0` to `0` and `1` to `1` exactly, so a finished tween lands on its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    /// Used when a step does not name a curve.
    #[default]
    #[serde(alias = "smooth")]
    InOutCubic,
    InOutSine,
}

impl Ease {
    /// Eased progress for `t`, clamped to `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => quad(t),
            Self::OutQuad => out(quad, t),
            Self::InOutQuad => in_out(quad, t),
            Self::InCubic => cubic(t),
            Self::OutCubic => out(cubic, t),
            Self::InOutCubic => in_out(cubic, t),
            Self::InOutSine => (1.0 - (PI * t).cos()) / 2.0,
        }
    }
}

fn quad(t: f64) -> f64 {
    t * t
}

fn cubic(t: f64) -> f64 {
    t * t * t
}

fn out(curve: fn(f64) -> f64, t: f64) -> f64 {
    1.0 - curve(1.0 - t)
}

fn in_out(curve: fn(f64) -> f64, t: f64) -> f64 {
    if t < 0.5 {
        curve(2.0 * t) / 2.0
    } else {
        1.0 - curve(2.0 - 2.0 * t) / 2.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
