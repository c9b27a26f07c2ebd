use crate::animation::ease::Ease;
use crate::animation::value::Value;
use crate::foundation::ids::{NodeId, SignalId};
use crate::scene::binding::Expr;
use crate::scene::property::{Field, PropKey};
use crate::timeline::step::{EndValue, Step, Target, Tween};

pub fn prop(node: NodeId, prop: PropKey) -> Target {
    Target::Field {
        node,
        field: Field::whole(prop),
    }
}

pub fn field(node: NodeId, field: Field) -> Target {
    Target::Field { node, field }
}

pub fn signal(id: SignalId) -> Target {
    Target::Signal(id)
}

pub fn absolute(node: NodeId) -> Target {
    Target::Absolute(node)
}

/// Tween `target` to `value` over `duration` seconds with the default smooth ease.
pub fn tween(target: Target, value: impl Into<Value>, duration: f64) -> Step {
    tween_eased(target, value, duration, Ease::default())
}

pub fn tween_eased(target: Target, value: impl Into<Value>, duration: f64, ease: Ease) -> Step {
    Step::Tween(Tween {
        target,
        to: EndValue::Literal(value.into()),
        duration,
        ease,
    })
}

/// Tween toward a moving value and stay bound to it afterwards.
pub fn track(target: Target, expr: Expr, duration: f64) -> Step {
    Step::Tween(Tween {
        target,
        to: EndValue::Track(expr),
        duration,
        ease: Ease::default(),
    })
}

/// Zero-duration tween.
pub fn set(target: Target, value: impl Into<Value>) -> Step {
    tween_eased(target, value, 0.0, Ease::Linear)
}

pub fn bind(target: Target, expr: Expr) -> Step {
    Step::Bind { target, expr }
}

pub fn save(node: NodeId) -> Step {
    Step::Save(node)
}

pub fn restore(node: NodeId, duration: f64) -> Step {
    Step::Restore {
        node,
        duration,
        ease: Ease::default(),
    }
}

pub fn wait(duration: f64) -> Step {
    Step::Wait(duration)
}

pub fn chain(steps: impl IntoIterator<Item = Step>) -> Step {
    Step::Chain(steps.into_iter().collect())
}

pub fn all(steps: impl IntoIterator<Item = Step>) -> Step {
    Step::All(steps.into_iter().collect())
}

pub fn spawn(step: Step) -> Step {
    Step::Spawn(Box::new(step))
}

pub fn delay(by: f64, step: Step) -> Step {
    Step::Delay {
        by,
        step: Box::new(step),
    }
}

pub fn sequence(stagger: f64, steps: impl IntoIterator<Item = Step>) -> Step {
    Step::Sequence {
        stagger,
        steps: steps.into_iter().collect(),
    }
}

/// Static unrolling: `count` copies chained back-to-back.
pub fn repeat(count: u32, step: Step) -> Step {
    Step::Chain((0..count).map(|_| step.clone()).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/ops.rs"]
mod tests;
