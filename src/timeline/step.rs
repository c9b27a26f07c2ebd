use crate::animation::ease::Ease;
use crate::animation::value::Value;
use crate::foundation::ids::{NodeId, SignalId};
use crate::scene::binding::Expr;
use crate::scene::property::Field;

/// What a tween writes to.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    /// A node property, or one component of it.
    Field { node: NodeId, field: Field },
    /// A scene signal.
    Signal(SignalId),
    /// A node's scene-space position; written back through the parent's inverse transform.
    Absolute(NodeId),
}

/// End value of a tween.
#[derive(Clone, Debug, PartialEq)]
pub enum EndValue {
    Literal(Value),
    /// Re-evaluated every frame while the tween runs; the target stays bound to it afterwards.
    Track(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    pub target: Target,
    pub to: EndValue,
    /// Seconds; zero applies the end value immediately.
    pub duration: f64,
    pub ease: Ease,
}

/// One instruction of a scene script.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Tween(Tween),
    /// Attach a derived rule to a target without animating.
    Bind { target: Target, expr: Expr },
    /// Push a snapshot of the node's current values.
    Save(NodeId),
    /// Animate back to the most recent unconsumed snapshot.
    Restore {
        node: NodeId,
        duration: f64,
        ease: Ease,
    },
    Wait(f64),
    /// Run back-to-back; each step starts when the previous one reaches its targets.
    Chain(Vec<Step>),
    /// Run together; completes with the slowest member.
    All(Vec<Step>),
    /// Start without waiting. The enclosing script continues immediately.
    Spawn(Box<Step>),
    Delay { by: f64, step: Box<Step> },
    /// Start member `i` at `i * stagger`; completes with the last member to finish.
    Sequence { stagger: f64, steps: Vec<Step> },
}

/// Static timing of a step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Extent {
    /// Seconds until a chained successor may start.
    pub duration: f64,
    /// Seconds until this step and everything it spawned have finished.
    pub settle: f64,
}

impl Extent {
    fn leaf(d: f64) -> Self {
        let d = d.max(0.0);
        Self {
            duration: d,
            settle: d,
        }
    }
}

impl Step {
    pub fn extent(&self) -> Extent {
        match self {
            Self::Tween(t) => Extent::leaf(t.duration),
            Self::Restore { duration, .. } => Extent::leaf(*duration),
            Self::Wait(d) => Extent::leaf(*d),
            Self::Bind { .. } | Self::Save(_) => Extent::default(),
            Self::Chain(steps) => {
                let mut at = 0.0;
                let mut settle: f64 = 0.0;
                for s in steps {
                    let e = s.extent();
                    settle = settle.max(at + e.settle);
                    at += e.duration;
                }
                Extent {
                    duration: at,
                    settle: settle.max(at),
                }
            }
            Self::All(steps) => steps.iter().map(Step::extent).fold(Extent::default(), |a, e| {
                Extent {
                    duration: a.duration.max(e.duration),
                    settle: a.settle.max(e.settle),
                }
            }),
            Self::Spawn(inner) => Extent {
                duration: 0.0,
                settle: inner.extent().settle,
            },
            Self::Delay { by, step } => {
                let e = step.extent();
                let by = by.max(0.0);
                Extent {
                    duration: by + e.duration,
                    settle: by + e.settle,
                }
            }
            Self::Sequence { stagger, steps } => {
                let stagger = stagger.max(0.0);
                steps
                    .iter()
                    .enumerate()
                    .map(|(i, s)| {
                        let e = s.extent();
                        let off = stagger * i as f64;
                        Extent {
                            duration: off + e.duration,
                            settle: off + e.settle,
                        }
                    })
                    .fold(Extent::default(), |a, e| Extent {
                        duration: a.duration.max(e.duration),
                        settle: a.settle.max(e.settle),
                    })
            }
        }
    }

    pub fn duration(&self) -> f64 {
        self.extent().duration
    }

    /// Short label for logs.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Tween(_) => "tween",
            Self::Bind { .. } => "bind",
            Self::Save(_) => "save",
            Self::Restore { .. } => "restore",
            Self::Wait(_) => "wait",
            Self::Chain(_) => "chain",
            Self::All(_) => "all",
            Self::Spawn(_) => "spawn",
            Self::Delay { .. } => "delay",
            Self::Sequence { .. } => "sequence",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/step.rs"]
mod tests;
