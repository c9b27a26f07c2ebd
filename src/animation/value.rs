use crate::animation::lerp::Lerp;
use crate::foundation::core::Vec2;
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::style::color::Color;
use serde::Serialize as _;

/// Dynamically typed property value.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Scalar (opacity, rotation, line width, ...).
    Number(f64),
    /// 2D vector (position, size, scale).
    #[serde(serialize_with = "ser_vec2")]
    Vec2(Vec2),
    /// Straight-alpha color.
    Color(Color),
    /// Flag; switches without interpolation.
    Bool(bool),
    /// Text content; switches without interpolation.
    Text(String),
    /// Polyline points.
    #[serde(serialize_with = "ser_points")]
    Points(Vec<Vec2>),
}

/// Kind tag of a [`Value`], used to check tween targets against property types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    Vec2,
    Color,
    Bool,
    Text,
    Points,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Number => "number",
            Self::Vec2 => "vec2",
            Self::Color => "color",
            Self::Bool => "bool",
            Self::Text => "text",
            Self::Points => "points",
        };
        f.write_str(s)
    }
}

fn ser_vec2<S: serde::Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
    [v.x, v.y].serialize(s)
}

fn ser_points<S: serde::Serializer>(v: &[Vec2], s: S) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = s.serialize_seq(Some(v.len()))?;
    for p in v {
        seq.serialize_element(&[p.x, p.y])?;
    }
    seq.end()
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Color(_) => ValueKind::Color,
            Self::Bool(_) => ValueKind::Bool,
            Self::Text(_) => ValueKind::Text,
            Self::Points(_) => ValueKind::Points,
        }
    }

    pub fn as_number(&self) -> ChoreoResult<f64> {
        match self {
            Self::Number(v) => Ok(*v),
            other => Err(kind_mismatch(ValueKind::Number, other.kind())),
        }
    }

    pub fn as_vec2(&self) -> ChoreoResult<Vec2> {
        match self {
            Self::Vec2(v) => Ok(*v),
            other => Err(kind_mismatch(ValueKind::Vec2, other.kind())),
        }
    }

    pub fn as_color(&self) -> ChoreoResult<Color> {
        match self {
            Self::Color(v) => Ok(*v),
            other => Err(kind_mismatch(ValueKind::Color, other.kind())),
        }
    }

    /// Interpolate between two values of the same kind.
    ///
    /// Flags, text and point lists of different lengths hold `a` until `t` reaches 1.
    pub fn interpolate(a: &Value, b: &Value, t: f64) -> ChoreoResult<Value> {
        let held = |a: &Value, b: &Value| if t >= 1.0 { b.clone() } else { a.clone() };
        let out = match (a, b) {
            (Self::Number(x), Self::Number(y)) => Self::Number(<f64 as Lerp>::lerp(x, y, t)),
            (Self::Vec2(x), Self::Vec2(y)) => Self::Vec2(<Vec2 as Lerp>::lerp(x, y, t)),
            (Self::Color(x), Self::Color(y)) => Self::Color(Color::lerp(x, y, t)),
            (Self::Points(x), Self::Points(y)) if x.len() == y.len() => Self::Points(
                x.iter()
                    .zip(y)
                    .map(|(p, q)| <Vec2 as Lerp>::lerp(p, q, t))
                    .collect(),
            ),
            (Self::Points(_), Self::Points(_))
            | (Self::Bool(_), Self::Bool(_))
            | (Self::Text(_), Self::Text(_)) => held(a, b),
            _ => return Err(kind_mismatch(a.kind(), b.kind())),
        };
        Ok(out)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

pub(crate) fn kind_mismatch(expected: ValueKind, got: ValueKind) -> ChoreoError {
    ChoreoError::authoring(format!("expected a {expected} value, got {got}"))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/value.rs"]
mod tests;
