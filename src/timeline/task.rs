use crate::animation::ease::Ease;
use crate::animation::value::Value;
use crate::foundation::core::TIME_EPSILON;
use crate::foundation::error::ChoreoResult;
use crate::scene::binding::Expr;
use crate::scene::graph::{SceneGraph, Slot};
use crate::scene::property::{Axis, Field, PropKey};
use crate::timeline::step::{EndValue, Step, Target, Tween};

/// Outcome of advancing a running task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Poll {
    /// Finished; carries the exact logical end time.
    Ready(f64),
    Pending,
}

/// A step that has been started at a known logical time.
#[derive(Debug)]
pub(crate) enum Task {
    Tween(TweenTask),
    Wait {
        end: f64,
    },
    Chain {
        steps: Vec<Step>,
        next: usize,
        current: Option<Box<Task>>,
        cursor: f64,
    },
    All {
        start: f64,
        members: Vec<Member>,
    },
    /// Already applied; completes at the given time.
    Instant(f64),
}

#[derive(Debug)]
pub(crate) struct Member {
    task: Task,
    end: Option<f64>,
}

#[derive(Debug)]
pub(crate) struct TweenTask {
    target: Target,
    from: Value,
    to: EndValue,
    start: f64,
    duration: f64,
    ease: Ease,
}

fn reached(now: f64, end: f64) -> bool {
    now + TIME_EPSILON >= end
}

impl Task {
    /// Start `step` at logical time `at`.
    ///
    /// Instant effects (save, bind) are applied here. Spawned steps are started and pushed onto
    /// `detached`; the returned task does not wait for them.
    pub(crate) fn start(
        step: &Step,
        at: f64,
        graph: &mut SceneGraph,
        detached: &mut Vec<Task>,
    ) -> ChoreoResult<Self> {
        tracing::debug!(step = step.label(), at, "start step");
        let task = match step {
            Step::Tween(tween) => Self::Tween(TweenTask::start(tween, at, graph)?),
            Step::Bind { target, expr } => {
                bind_target(graph, target, expr.clone())?;
                Self::Instant(at)
            }
            Step::Save(node) => {
                graph.save(*node)?;
                Self::Instant(at)
            }
            Step::Restore {
                node,
                duration,
                ease,
            } => {
                let snapshot = graph.take_snapshot(*node)?;
                let mut members = Vec::new();
                for (prop, value) in snapshot.iter() {
                    let field = Field::whole(prop);
                    // A bound property is tweened even when it currently resolves to the saved
                    // value; its anchor may still move.
                    if matches!(graph.slot(*node, prop)?, Slot::Literal(v) if v == value) {
                        continue;
                    }
                    let tween = Tween {
                        target: Target::Field { node: *node, field },
                        to: EndValue::Literal(value.clone()),
                        duration: *duration,
                        ease: *ease,
                    };
                    members.push(Member::new(Self::Tween(TweenTask::start(
                        &tween, at, graph,
                    )?)));
                }
                // An empty restore still takes its full duration.
                members.push(Member::new(Self::Wait {
                    end: at + duration.max(0.0),
                }));
                Self::All { start: at, members }
            }
            Step::Wait(d) => Self::Wait {
                end: at + d.max(0.0),
            },
            Step::Chain(steps) => Self::Chain {
                steps: steps.clone(),
                next: 0,
                current: None,
                cursor: at,
            },
            Step::All(steps) => {
                let members = steps
                    .iter()
                    .map(|s| Ok(Member::new(Self::start(s, at, graph, detached)?)))
                    .collect::<ChoreoResult<Vec<_>>>()?;
                Self::All { start: at, members }
            }
            Step::Spawn(inner) => {
                let task = Self::start(inner, at, graph, detached)?;
                detached.push(task);
                Self::Instant(at)
            }
            Step::Delay { by, step } => Self::Chain {
                steps: vec![Step::Wait(*by), (**step).clone()],
                next: 0,
                current: None,
                cursor: at,
            },
            Step::Sequence { stagger, steps } => {
                let stagger = stagger.max(0.0);
                let mut members = Vec::with_capacity(steps.len());
                for (i, s) in steps.iter().enumerate() {
                    members.push(Member::new(Self::Chain {
                        steps: vec![Step::Wait(stagger * i as f64), s.clone()],
                        next: 0,
                        current: None,
                        cursor: at,
                    }));
                }
                Self::All { start: at, members }
            }
        };
        Ok(task)
    }

    /// Earliest logical time at which a running part of this task finishes, or at which a chain
    /// starts its next step.
    pub(crate) fn next_boundary(&self) -> Option<f64> {
        match self {
            Self::Tween(t) => Some(t.end()),
            Self::Wait { end } => Some(*end),
            Self::Instant(at) => Some(*at),
            Self::Chain {
                current, cursor, ..
            } => match current {
                Some(task) => task.next_boundary(),
                None => Some(*cursor),
            },
            Self::All { members, .. } => members
                .iter()
                .filter(|m| m.end.is_none())
                .filter_map(|m| m.task.next_boundary())
                .min_by(f64::total_cmp),
        }
    }

    /// Write every running tween's value at `now` without finishing or starting anything.
    pub(crate) fn sample(&self, now: f64, graph: &mut SceneGraph) -> ChoreoResult<()> {
        match self {
            Self::Tween(t) => t.write_at(now, graph),
            Self::Chain {
                current: Some(task),
                ..
            } => task.sample(now, graph),
            Self::All { members, .. } => members
                .iter()
                .filter(|m| m.end.is_none())
                .try_for_each(|m| m.task.sample(now, graph)),
            _ => Ok(()),
        }
    }

    /// Advance to `now`, writing interpolated values into the graph.
    pub(crate) fn advance(
        &mut self,
        now: f64,
        graph: &mut SceneGraph,
        detached: &mut Vec<Task>,
    ) -> ChoreoResult<Poll> {
        match self {
            Self::Tween(t) => t.advance(now, graph),
            Self::Wait { end } => Ok(if reached(now, *end) {
                Poll::Ready(*end)
            } else {
                Poll::Pending
            }),
            Self::Instant(at) => Ok(Poll::Ready(*at)),
            Self::Chain {
                steps,
                next,
                current,
                cursor,
            } => loop {
                let mut task = match current.take() {
                    Some(task) => task,
                    None => {
                        let Some(step) = steps.get(*next) else {
                            return Ok(Poll::Ready(*cursor));
                        };
                        *next += 1;
                        // The successor starts at the predecessor's logical end, not at `now`.
                        Box::new(Self::start(step, *cursor, graph, detached)?)
                    }
                };
                match task.advance(now, graph, detached)? {
                    Poll::Ready(end) => *cursor = end,
                    Poll::Pending => {
                        *current = Some(task);
                        return Ok(Poll::Pending);
                    }
                }
            },
            Self::All { start, members } => {
                let mut end = *start;
                let mut pending = false;
                for m in members.iter_mut() {
                    if m.end.is_none()
                        && let Poll::Ready(e) = m.task.advance(now, graph, detached)?
                    {
                        m.end = Some(e);
                    }
                    match m.end {
                        Some(e) => end = end.max(e),
                        None => pending = true,
                    }
                }
                Ok(if pending {
                    Poll::Pending
                } else {
                    Poll::Ready(end)
                })
            }
        }
    }
}

impl Member {
    fn new(task: Task) -> Self {
        Self { task, end: None }
    }
}

impl TweenTask {
    fn start(tween: &Tween, at: f64, graph: &SceneGraph) -> ChoreoResult<Self> {
        let from = read_target(graph, &tween.target)?;
        Ok(Self {
            target: tween.target.clone(),
            from,
            to: tween.to.clone(),
            start: at,
            duration: tween.duration.max(0.0),
            ease: tween.ease,
        })
    }

    fn end_value(&self, graph: &SceneGraph) -> ChoreoResult<Value> {
        match &self.to {
            EndValue::Literal(v) => Ok(v.clone()),
            EndValue::Track(expr) => graph.eval(expr),
        }
    }

    fn end(&self) -> f64 {
        self.start + self.duration
    }

    fn write_at(&self, now: f64, graph: &mut SceneGraph) -> ChoreoResult<()> {
        let t = if reached(now, self.end()) {
            1.0
        } else {
            ((now - self.start) / self.duration).clamp(0.0, 1.0)
        };
        let to = self.end_value(graph)?;
        let v = Value::interpolate(&self.from, &to, self.ease.apply(t))?;
        write_target(graph, &self.target, v)
    }

    fn advance(&mut self, now: f64, graph: &mut SceneGraph) -> ChoreoResult<Poll> {
        let end = self.end();
        if reached(now, end) {
            match &self.to {
                EndValue::Literal(v) => write_target(graph, &self.target, v.clone())?,
                EndValue::Track(expr) => bind_target(graph, &self.target, expr.clone())?,
            }
            return Ok(Poll::Ready(end));
        }
        self.write_at(now, graph)?;
        Ok(Poll::Pending)
    }
}

fn read_target(graph: &SceneGraph, target: &Target) -> ChoreoResult<Value> {
    match target {
        Target::Field { node, field } => graph.get(*node, *field),
        Target::Signal(id) => graph.get_signal(*id),
        Target::Absolute(node) => Ok(Value::Vec2(graph.absolute_position(*node)?)),
    }
}

fn write_target(graph: &mut SceneGraph, target: &Target, value: Value) -> ChoreoResult<()> {
    match target {
        Target::Field { node, field } => graph.set(*node, *field, value),
        Target::Signal(id) => graph.set_signal(*id, value),
        Target::Absolute(node) => graph.set_absolute_position(*node, value.as_vec2()?),
    }
}

/// Attach `expr` to a target so it keeps being re-evaluated.
///
/// A single component is bound together with the other component frozen at its current value.
pub(crate) fn bind_target(graph: &mut SceneGraph, target: &Target, expr: Expr) -> ChoreoResult<()> {
    match target {
        Target::Field { node, field } => match field.axis {
            None => graph.bind(*node, field.prop, expr),
            Some(axis) => {
                let whole = graph.get(*node, Field::whole(field.prop))?.as_vec2()?;
                let other = Expr::constant(match axis {
                    Axis::X => whole.y,
                    Axis::Y => whole.x,
                });
                let (x, y) = match axis {
                    Axis::X => (expr, other),
                    Axis::Y => (other, expr),
                };
                graph.bind(*node, field.prop, Expr::Vec2(Box::new(x), Box::new(y)))
            }
        },
        Target::Signal(id) => graph.bind_signal(*id, expr),
        Target::Absolute(node) => graph.bind(
            *node,
            PropKey::Position,
            Expr::ToLocal {
                node: *node,
                world: Box::new(expr),
            },
        ),
    }
}
