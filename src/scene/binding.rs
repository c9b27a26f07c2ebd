use crate::animation::value::{Value, kind_mismatch};
use crate::foundation::core::Vec2;
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::foundation::ids::{NodeId, SignalId};
use crate::scene::property::{Axis, Field};

/// Derived value recomputed from the current scene state every time it is read.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Fixed value.
    Const(Value),
    /// Current value of a scene signal.
    Signal(SignalId),
    /// Current value of another node's property.
    Prop { node: NodeId, field: Field },
    /// Current absolute (scene-space) position of a node.
    Absolute(NodeId),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    /// Component-wise product; a number operand scales a vector.
    Mul(Box<Expr>, Box<Expr>),
    Scale(Box<Expr>, f64),
    /// Build a vector from two numeric expressions.
    Vec2(Box<Expr>, Box<Expr>),
    /// Extract one component of a vector expression.
    Component(Box<Expr>, Axis),
    /// Build a point list.
    Points(Vec<Expr>),
    /// Scene-space point expressed in the local space of `node`'s parent.
    ToLocal { node: NodeId, world: Box<Expr> },
}

impl Expr {
    pub fn constant(v: impl Into<Value>) -> Self {
        Self::Const(v.into())
    }

    pub fn signal(id: SignalId) -> Self {
        Self::Signal(id)
    }

    pub fn absolute(node: NodeId) -> Self {
        Self::Absolute(node)
    }

    pub fn prop(node: NodeId, field: Field) -> Self {
        Self::Prop { node, field }
    }

    /// `self + offset`, the usual "anchor plus offset" binding.
    pub fn offset(self, by: Vec2) -> Self {
        Self::Add(Box::new(self), Box::new(Self::Const(Value::Vec2(by))))
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::Scale(Box::new(self), factor)
    }

    pub fn x(self) -> Self {
        Self::Component(Box::new(self), Axis::X)
    }

    pub fn y(self) -> Self {
        Self::Component(Box::new(self), Axis::Y)
    }
}

pub(crate) fn add(a: Value, b: Value) -> ChoreoResult<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
        (Value::Vec2(x), Value::Vec2(y)) => Ok(Value::Vec2(x + y)),
        (Value::Points(ps), Value::Vec2(d)) => {
            Ok(Value::Points(ps.iter().map(|p| *p + d).collect()))
        }
        (a, b) => Err(arith_error("add", &a, &b)),
    }
}

pub(crate) fn sub(a: Value, b: Value) -> ChoreoResult<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x - y)),
        (Value::Vec2(x), Value::Vec2(y)) => Ok(Value::Vec2(x - y)),
        (a, b) => Err(arith_error("subtract", &a, &b)),
    }
}

pub(crate) fn mul(a: Value, b: Value) -> ChoreoResult<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x * y)),
        (Value::Vec2(v), Value::Number(s)) | (Value::Number(s), Value::Vec2(v)) => {
            Ok(Value::Vec2(v * s))
        }
        (Value::Vec2(x), Value::Vec2(y)) => Ok(Value::Vec2(Vec2::new(x.x * y.x, x.y * y.y))),
        (Value::Points(ps), Value::Number(s)) => {
            Ok(Value::Points(ps.iter().map(|p| *p * s).collect()))
        }
        (a, b) => Err(arith_error("multiply", &a, &b)),
    }
}

pub(crate) fn scale(v: Value, factor: f64) -> ChoreoResult<Value> {
    mul(v, Value::Number(factor))
}

pub(crate) fn component(v: Value, axis: Axis) -> ChoreoResult<Value> {
    Ok(Value::Number(axis.get(v.as_vec2()?)))
}

pub(crate) fn make_vec2(x: Value, y: Value) -> ChoreoResult<Value> {
    Ok(Value::Vec2(Vec2::new(x.as_number()?, y.as_number()?)))
}

pub(crate) fn make_points(values: Vec<Value>) -> ChoreoResult<Value> {
    values
        .iter()
        .map(Value::as_vec2)
        .collect::<ChoreoResult<Vec<_>>>()
        .map(Value::Points)
}

fn arith_error(op: &str, a: &Value, b: &Value) -> ChoreoError {
    if a.kind() == b.kind() {
        return ChoreoError::authoring(format!("cannot {op} two {} values", a.kind()));
    }
    let err = kind_mismatch(a.kind(), b.kind());
    ChoreoError::authoring(format!("cannot {op}: {err}"))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/binding.rs"]
mod tests;
