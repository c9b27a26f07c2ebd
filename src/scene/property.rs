use crate::animation::value::{Value, ValueKind};
use crate::foundation::core::Vec2;
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::style::color::Color;
use serde::{Deserialize, Serialize};

/// Shape primitive a node draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Transform-only container.
    Group,
    /// Rounded rectangle.
    Rect,
    /// Circle or arc.
    Circle,
    /// Polyline with optional arrow heads.
    Line,
    /// Text label.
    #[serde(alias = "txt")]
    Text,
    /// Named vector icon; the glyph itself is resolved by the renderer.
    Icon,
}

/// Animatable property of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKey {
    Position,
    /// Degrees, clockwise.
    Rotation,
    Scale,
    Opacity,
    Size,
    #[serde(alias = "color")]
    Fill,
    Stroke,
    #[serde(alias = "lineWidth")]
    LineWidth,
    Radius,
    #[serde(alias = "fontSize")]
    FontSize,
    #[serde(alias = "fontWeight")]
    FontWeight,
    #[serde(alias = "fontFamily")]
    FontFamily,
    Text,
    #[serde(alias = "startAngle")]
    StartAngle,
    #[serde(alias = "endAngle")]
    EndAngle,
    Closed,
    Points,
    #[serde(alias = "arrowSize")]
    ArrowSize,
    #[serde(alias = "startArrow")]
    StartArrow,
    #[serde(alias = "endArrow")]
    EndArrow,
    /// `(dash, gap)` lengths; zero dash draws a solid line.
    #[serde(alias = "lineDash")]
    LineDash,
    Icon,
}

impl PropKey {
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Position | Self::Scale | Self::Size | Self::LineDash => ValueKind::Vec2,
            Self::Fill | Self::Stroke => ValueKind::Color,
            Self::Closed | Self::StartArrow | Self::EndArrow => ValueKind::Bool,
            Self::FontFamily | Self::Text | Self::Icon => ValueKind::Text,
            Self::Points => ValueKind::Points,
            Self::Rotation
            | Self::Opacity
            | Self::LineWidth
            | Self::Radius
            | Self::FontSize
            | Self::FontWeight
            | Self::StartAngle
            | Self::EndAngle
            | Self::ArrowSize => ValueKind::Number,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
            Self::Opacity => "opacity",
            Self::Size => "size",
            Self::Fill => "fill",
            Self::Stroke => "stroke",
            Self::LineWidth => "line_width",
            Self::Radius => "radius",
            Self::FontSize => "font_size",
            Self::FontWeight => "font_weight",
            Self::FontFamily => "font_family",
            Self::Text => "text",
            Self::StartAngle => "start_angle",
            Self::EndAngle => "end_angle",
            Self::Closed => "closed",
            Self::Points => "points",
            Self::ArrowSize => "arrow_size",
            Self::StartArrow => "start_arrow",
            Self::EndArrow => "end_arrow",
            Self::LineDash => "line_dash",
            Self::Icon => "icon",
        }
    }
}

impl std::fmt::Display for PropKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vector component selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn get(self, v: Vec2) -> f64 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
        }
    }

    pub fn with(self, mut v: Vec2, c: f64) -> Vec2 {
        match self {
            Self::X => v.x = c,
            Self::Y => v.y = c,
        }
        v
    }
}

/// A property, or one component of a vector property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub prop: PropKey,
    pub axis: Option<Axis>,
}

impl Field {
    pub fn whole(prop: PropKey) -> Self {
        Self { prop, axis: None }
    }

    /// Parse a field name such as `opacity`, `lineWidth`, `x` or `height`.
    pub fn parse(name: &str) -> ChoreoResult<Self> {
        let component = |prop, axis| Self {
            prop,
            axis: Some(axis),
        };
        let field = match name {
            "x" => component(PropKey::Position, Axis::X),
            "y" => component(PropKey::Position, Axis::Y),
            "width" => component(PropKey::Size, Axis::X),
            "height" => component(PropKey::Size, Axis::Y),
            "scale_x" | "scaleX" => component(PropKey::Scale, Axis::X),
            "scale_y" | "scaleY" => component(PropKey::Scale, Axis::Y),
            _ => {
                let prop: PropKey = serde_json::from_value(serde_json::Value::from(name))
                    .map_err(|_| ChoreoError::construction(format!("unknown property '{name}'")))?;
                Self::whole(prop)
            }
        };
        Ok(field)
    }

    pub fn value_kind(self) -> ValueKind {
        match self.axis {
            Some(_) => ValueKind::Number,
            None => self.prop.value_kind(),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.axis {
            None => write!(f, "{}", self.prop),
            Some(Axis::X) => write!(f, "{}.x", self.prop),
            Some(Axis::Y) => write!(f, "{}.y", self.prop),
        }
    }
}

impl NodeKind {
    /// Library defaults for every property this kind carries.
    pub fn defaults(self) -> Vec<(PropKey, Value)> {
        let mut out = vec![
            (PropKey::Position, Value::Vec2(Vec2::ZERO)),
            (PropKey::Rotation, Value::Number(0.0)),
            (PropKey::Scale, Value::Vec2(Vec2::new(1.0, 1.0))),
            (PropKey::Opacity, Value::Number(1.0)),
        ];
        let shape = [
            (PropKey::Size, Value::Vec2(Vec2::ZERO)),
            (PropKey::Fill, Value::Color(Color::TRANSPARENT)),
            (PropKey::Stroke, Value::Color(Color::TRANSPARENT)),
            (PropKey::LineWidth, Value::Number(0.0)),
            (PropKey::Radius, Value::Number(0.0)),
        ];
        match self {
            Self::Group => {}
            Self::Rect => out.extend(shape),
            Self::Circle => {
                out.extend(shape);
                out.extend([
                    (PropKey::StartAngle, Value::Number(0.0)),
                    (PropKey::EndAngle, Value::Number(360.0)),
                    (PropKey::Closed, Value::Bool(true)),
                ]);
            }
            Self::Line => out.extend([
                (PropKey::Points, Value::Points(Vec::new())),
                (PropKey::Stroke, Value::Color(Color::WHITE)),
                (PropKey::LineWidth, Value::Number(1.0)),
                (PropKey::LineDash, Value::Vec2(Vec2::ZERO)),
                (PropKey::ArrowSize, Value::Number(24.0)),
                (PropKey::StartArrow, Value::Bool(false)),
                (PropKey::EndArrow, Value::Bool(false)),
            ]),
            Self::Text => out.extend([
                (PropKey::Text, Value::Text(String::new())),
                (PropKey::Fill, Value::Color(Color::WHITE)),
                (PropKey::FontSize, Value::Number(48.0)),
                (PropKey::FontWeight, Value::Number(400.0)),
                (PropKey::FontFamily, Value::Text("sans-serif".to_owned())),
            ]),
            Self::Icon => out.extend([
                (PropKey::Icon, Value::Text(String::new())),
                (PropKey::Fill, Value::Color(Color::WHITE)),
                (PropKey::Size, Value::Vec2(Vec2::new(48.0, 48.0))),
            ]),
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/property.rs"]
mod tests;
