use crate::animation::ease::Ease;
use crate::animation::value::{Value, ValueKind};
use crate::foundation::core::{Canvas, Fps, Vec2};
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::foundation::ids::NodeId;
use crate::scene::binding::Expr;
use crate::scene::graph::{SceneGraph, Slot};
use crate::scene::model::{ExprDef, NodeDef, PropDef, ScalarDef, SceneDef, StepDef};
use crate::scene::property::{Axis, Field, NodeKind, PropKey};
use crate::scene::style::{StyleDef, StyleSheet};
use crate::scene::variables::Variables;
use crate::style::color::Color;
use crate::timeline::ops;
use crate::timeline::step::{EndValue, Extent, Step, Target, Tween};
use crate::timeline::task::bind_target;
use std::collections::{BTreeMap, BTreeSet};

static NO_STYLES: BTreeMap<String, StyleDef> = BTreeMap::new();

/// A built scene: its shape tree and compiled script, ready to be played.
#[derive(Clone, Debug)]
pub struct Scene {
    name: String,
    fps: Fps,
    graph: SceneGraph,
    script: Step,
}

impl Scene {
    pub fn new(name: impl Into<String>, fps: Fps, graph: SceneGraph, script: Step) -> Self {
        Self {
            name: name.into(),
            fps,
            graph,
            script,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn script(&self) -> &Step {
        &self.script
    }

    pub fn extent(&self) -> Extent {
        self.script.extent()
    }
}

/// Project context a scene is built against.
#[derive(Clone, Copy, Debug)]
pub struct BuildEnv<'a> {
    pub variables: &'a Variables,
    pub styles: &'a BTreeMap<String, StyleDef>,
    pub canvas: Canvas,
    pub fps: Fps,
}

impl<'a> BuildEnv<'a> {
    /// No shared styles, default canvas and fps.
    pub fn new(variables: &'a Variables) -> Self {
        Self {
            variables,
            styles: &NO_STYLES,
            canvas: Canvas::default(),
            fps: Fps::default(),
        }
    }

    pub fn with_styles(mut self, styles: &'a BTreeMap<String, StyleDef>) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }
}

/// Build a scene definition into a playable [`Scene`].
///
/// Order: constants, nodes (with styles and variables merged), background, signals, node
/// bindings, script, setup saves. Every failure is a [`ChoreoError::Construction`].
#[tracing::instrument(skip(def, env), fields(nodes = def.nodes.len(), steps = def.script.len()))]
pub fn build(name: &str, def: &SceneDef, env: &BuildEnv<'_>) -> ChoreoResult<Scene> {
    let constants = resolve_constants(&def.constants, env.variables)?;
    let mut b = Builder {
        vars: env.variables,
        constants,
        styles: StyleSheet::new(env.styles, &def.styles),
        graph: SceneGraph::new(env.canvas),
        deferred: Vec::new(),
    };

    for node in &def.nodes {
        b.add_node(node, None)?;
    }

    if let Some(bg) = &def.background {
        let view = b.graph.view();
        b.apply(view, "background", Field::whole(PropKey::Fill), bg)?;
    }

    for sig in &def.signals {
        let ctx = |e: ChoreoError| e.at_build(format!("signal '{}'", sig.name));
        let slot = match &sig.value {
            PropDef::Bind { bind } => Slot::Bound(b.expr(bind).map_err(ctx)?),
            other => Slot::Literal(b.json(other).and_then(|j| infer(&j)).map_err(ctx)?),
        };
        b.graph.add_signal(&sig.name, slot).map_err(ctx)?;
    }

    for (node, field, expr) in std::mem::take(&mut b.deferred) {
        let label = format!("{} of '{}'", field, b.graph.node_name(node));
        let expr = b.expr(&expr).map_err(|e| e.at_build(&label))?;
        bind_target(&mut b.graph, &Target::Field { node, field }, expr)
            .map_err(|e| e.at_build(&label))?;
    }

    let script = ops::chain(
        def.script
            .iter()
            .map(|s| b.step(s))
            .collect::<ChoreoResult<Vec<_>>>()?,
    );

    for name in &def.save {
        let id = b.graph.node(name)?;
        b.graph
            .save(id)
            .map_err(|e| e.at_build(format!("setup save of '{name}'")))?;
    }

    let scene = Scene::new(name, env.fps, b.graph, script);
    tracing::debug!(
        nodes = scene.graph().len(),
        duration = scene.extent().duration,
        "scene built"
    );
    Ok(scene)
}

struct Builder<'a> {
    vars: &'a Variables,
    constants: BTreeMap<String, f64>,
    styles: StyleSheet<'a>,
    graph: SceneGraph,
    /// Node bindings applied once every node and signal exists.
    deferred: Vec<(NodeId, Field, ExprDef)>,
}

impl Builder<'_> {
    fn add_node(&mut self, def: &NodeDef, parent: Option<NodeId>) -> ChoreoResult<NodeId> {
        let id = self.graph.add_node(def.kind, parent, def.name.as_deref())?;
        let label = match &def.name {
            Some(n) => format!("node '{n}'"),
            None => format!("{:?} node {}", def.kind, self.graph.node_name(id)),
        };

        let mut props = self
            .styles
            .merged(&def.style.to_vec())
            .map_err(|e| e.at_build(&label))?;
        props.extend(def.props.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut fields = props
            .iter()
            .map(|(k, v)| Ok((Field::parse(k)?, v)))
            .collect::<ChoreoResult<Vec<_>>>()
            .map_err(|e| e.at_build(&label))?;
        // Whole properties first so `width` refines a `size` from a style.
        fields.sort_by_key(|(f, _)| f.axis.is_some());

        for (field, value) in fields {
            self.apply(id, &label, field, value)?;
        }
        for child in &def.children {
            self.add_node(child, Some(id))?;
        }
        Ok(id)
    }

    fn apply(&mut self, id: NodeId, label: &str, field: Field, def: &PropDef) -> ChoreoResult<()> {
        if let PropDef::Bind { bind } = def {
            self.deferred.push((id, field, bind.clone()));
            return Ok(());
        }
        let ctx = |e: ChoreoError| e.at_build(format!("{label}, {field}"));
        let json = self.json(def).map_err(ctx)?;
        let base = self.percent_base(id, field).map_err(ctx)?;
        let value = coerce(&json, field.value_kind(), base).map_err(ctx)?;
        self.graph.set(id, field, value).map_err(ctx)
    }

    /// Parent size that `"50%"` lengths resolve against.
    fn percent_base(&self, id: NodeId, field: Field) -> ChoreoResult<Option<Vec2>> {
        if !matches!(field.prop, PropKey::Size | PropKey::Position) {
            return Ok(None);
        }
        let parent = self.graph.parent(id)?.unwrap_or(self.graph.view());
        if self.graph.kind(parent)? == NodeKind::Group {
            return Ok(None);
        }
        let size = self.graph.get(parent, Field::whole(PropKey::Size))?.as_vec2()?;
        Ok(Some(match field.axis {
            Some(axis) => Vec2::new(axis.get(size), axis.get(size)),
            None => size,
        }))
    }

    /// Resolve a literal or variable property definition to raw JSON.
    fn json(&self, def: &PropDef) -> ChoreoResult<serde_json::Value> {
        match def {
            PropDef::Literal(v) => Ok(v.clone()),
            PropDef::Var { var, default } => {
                if let Some(n) = self.constants.get(var) {
                    return Ok(serde_json::Value::from(*n));
                }
                if let Some(v) = self.vars.get(var) {
                    return Ok(v.to_json());
                }
                default
                    .clone()
                    .ok_or_else(|| ChoreoError::construction(format!("missing variable '{var}'")))
            }
            PropDef::Bind { .. } => Err(ChoreoError::construction(
                "a binding is not allowed here",
            )),
        }
    }

    fn scalar(&self, def: &ScalarDef) -> ChoreoResult<f64> {
        scalar(def, &self.constants, self.vars)
    }

    fn duration(&self, def: &ScalarDef) -> ChoreoResult<f64> {
        let d = self.scalar(def)?;
        if !d.is_finite() || d < 0.0 {
            return Err(ChoreoError::construction(format!(
                "duration must be a non-negative number, got {d}"
            )));
        }
        Ok(d)
    }

    fn expr(&self, def: &ExprDef) -> ChoreoResult<Expr> {
        let bx = |d: &ExprDef| self.expr(d).map(Box::new);
        Ok(match def {
            ExprDef::Const(v) => Expr::Const(infer(v)?),
            ExprDef::Var(name) => {
                let json = self.json(&PropDef::Var {
                    var: name.clone(),
                    default: None,
                })?;
                Expr::Const(infer(&json)?)
            }
            ExprDef::Signal(name) => Expr::Signal(self.graph.signal(name)?),
            ExprDef::Prop(node, field) => Expr::Prop {
                node: self.graph.node(node)?,
                field: Field::parse(field)?,
            },
            ExprDef::Absolute(node) => Expr::Absolute(self.graph.node(node)?),
            ExprDef::Add(a, b) => Expr::Add(bx(a)?, bx(b)?),
            ExprDef::Sub(a, b) => Expr::Sub(bx(a)?, bx(b)?),
            ExprDef::Mul(a, b) => Expr::Mul(bx(a)?, bx(b)?),
            ExprDef::Scale(a, f) => Expr::Scale(bx(a)?, *f),
            ExprDef::Vec2(x, y) => Expr::Vec2(bx(x)?, bx(y)?),
            ExprDef::X(v) => Expr::Component(bx(v)?, Axis::X),
            ExprDef::Y(v) => Expr::Component(bx(v)?, Axis::Y),
            ExprDef::Points(ps) => {
                Expr::Points(ps.iter().map(|p| self.expr(p)).collect::<ChoreoResult<_>>()?)
            }
        })
    }

    /// Parse `"node.field"`, `"node.absolute_position"` or `"$signal"`.
    fn target(&self, s: &str) -> ChoreoResult<Target> {
        if let Some(name) = s.strip_prefix('$') {
            return Ok(Target::Signal(self.graph.signal(name)?));
        }
        let Some((node, field)) = s.rsplit_once('.') else {
            return Err(ChoreoError::construction(format!(
                "target '{s}' must be 'node.property' or '$signal'"
            )));
        };
        let node = self.graph.node(node)?;
        match field {
            "absolute_position" | "absolutePosition" => Ok(Target::Absolute(node)),
            _ => Ok(Target::Field {
                node,
                field: Field::parse(field)?,
            }),
        }
    }

    fn target_kind(&self, target: &Target) -> ChoreoResult<ValueKind> {
        match target {
            Target::Field { field, .. } => Ok(field.value_kind()),
            Target::Signal(id) => Ok(self.graph.get_signal(*id)?.kind()),
            Target::Absolute(_) => Ok(ValueKind::Vec2),
        }
    }

    fn end_value(&self, target: &Target, to: &PropDef) -> ChoreoResult<EndValue> {
        if let PropDef::Bind { bind } = to {
            return Ok(EndValue::Track(self.expr(bind)?));
        }
        let base = match target {
            Target::Field { node, field } => self.percent_base(*node, *field)?,
            _ => None,
        };
        let value = coerce(&self.json(to)?, self.target_kind(target)?, base)?;
        Ok(EndValue::Literal(value))
    }

    fn tween(
        &self,
        target: &str,
        to: &PropDef,
        duration: f64,
        ease: Ease,
    ) -> ChoreoResult<Step> {
        let resolved = self.target(target)?;
        let to = self
            .end_value(&resolved, to)
            .map_err(|e| e.at_build(format!("target '{target}'")))?;
        Ok(Step::Tween(Tween {
            target: resolved,
            to,
            duration,
            ease,
        }))
    }

    fn steps(&self, defs: &[StepDef]) -> ChoreoResult<Vec<Step>> {
        defs.iter().map(|s| self.step(s)).collect()
    }

    fn step(&self, def: &StepDef) -> ChoreoResult<Step> {
        Ok(match def {
            StepDef::Tween(t) => self.tween(
                &t.target,
                &t.to,
                self.duration(&t.duration)?,
                t.ease.unwrap_or_default(),
            )?,
            StepDef::Set(s) => self.tween(&s.target, &s.to, 0.0, Ease::Linear)?,
            StepDef::Bind(b) => ops::bind(self.target(&b.target)?, self.expr(&b.expr)?),
            StepDef::Save(names) => {
                let mut saves = names
                    .to_vec()
                    .iter()
                    .map(|n| Ok(ops::save(self.graph.node(n)?)))
                    .collect::<ChoreoResult<Vec<_>>>()?;
                match saves.len() {
                    1 => saves.remove(0),
                    _ => ops::all(saves),
                }
            }
            StepDef::Restore(r) => {
                let duration = self.duration(&r.duration)?;
                let ease = r.ease.unwrap_or_default();
                let mut restores = r
                    .node
                    .to_vec()
                    .iter()
                    .map(|n| {
                        Ok(Step::Restore {
                            node: self.graph.node(n)?,
                            duration,
                            ease,
                        })
                    })
                    .collect::<ChoreoResult<Vec<_>>>()?;
                match restores.len() {
                    1 => restores.remove(0),
                    _ => ops::all(restores),
                }
            }
            StepDef::Wait(d) => ops::wait(self.duration(d)?),
            StepDef::Chain(steps) => ops::chain(self.steps(steps)?),
            StepDef::All(steps) => ops::all(self.steps(steps)?),
            StepDef::Spawn(inner) => ops::spawn(self.step(inner)?),
            StepDef::Delay(d) => ops::delay(self.duration(&d.by)?, self.step(&d.step)?),
            StepDef::Sequence(s) => {
                ops::sequence(self.duration(&s.stagger)?, self.steps(&s.steps)?)
            }
            StepDef::Repeat(r) => ops::repeat(r.count, self.step(&r.step)?),
        })
    }
}

fn scalar(
    def: &ScalarDef,
    constants: &BTreeMap<String, f64>,
    vars: &Variables,
) -> ChoreoResult<f64> {
    match def {
        ScalarDef::Number(n) => Ok(*n),
        ScalarDef::Var {
            var,
            default,
            scale,
        } => {
            let base = match constants.get(var) {
                Some(n) => *n,
                None => match vars.get(var) {
                    Some(_) => vars.number_or(var, 0.0)?,
                    None => default.ok_or_else(|| {
                        ChoreoError::construction(format!("missing variable '{var}'"))
                    })?,
                },
            };
            Ok(base * scale)
        }
    }
}

/// Resolve scene constants; a constant may refer to project variables or other constants.
fn resolve_constants(
    defs: &BTreeMap<String, ScalarDef>,
    vars: &Variables,
) -> ChoreoResult<BTreeMap<String, f64>> {
    fn resolve(
        name: &str,
        defs: &BTreeMap<String, ScalarDef>,
        vars: &Variables,
        done: &mut BTreeMap<String, f64>,
        visiting: &mut BTreeSet<String>,
    ) -> ChoreoResult<f64> {
        if let Some(v) = done.get(name) {
            return Ok(*v);
        }
        if !visiting.insert(name.to_owned()) {
            return Err(ChoreoError::construction(format!(
                "constant '{name}' is defined in terms of itself"
            )));
        }
        let def = &defs[name];
        if let ScalarDef::Var { var, .. } = def
            && var != name
            && defs.contains_key(var)
        {
            resolve(var, defs, vars, done, visiting)?;
        }
        let v = scalar(def, done, vars).map_err(|e| e.at_build(format!("constant '{name}'")))?;
        visiting.remove(name);
        done.insert(name.to_owned(), v);
        Ok(v)
    }

    let mut done = BTreeMap::new();
    let mut visiting = BTreeSet::new();
    for name in defs.keys() {
        resolve(name, defs, vars, &mut done, &mut visiting)?;
    }
    Ok(done)
}

fn percent(s: &str) -> Option<f64> {
    let p: f64 = s.strip_suffix('%')?.trim().parse().ok()?;
    Some(p / 100.0)
}

fn length(json: &serde_json::Value, base: Option<f64>) -> ChoreoResult<f64> {
    if let Some(n) = json.as_f64() {
        return Ok(n);
    }
    let Some(p) = json.as_str().and_then(percent) else {
        return Err(ChoreoError::construction(format!("expected a number, got {json}")));
    };
    let base = base.ok_or_else(|| {
        ChoreoError::construction(format!("'{json}' needs a parent with a size"))
    })?;
    Ok(p * base)
}

/// Convert raw JSON into a value of `kind`.
///
/// A bare number fills both components of a vector (`40` becomes `[40, 40]`). `base` is the parent
/// size that percentage lengths resolve against.
pub(crate) fn coerce(
    json: &serde_json::Value,
    kind: ValueKind,
    base: Option<Vec2>,
) -> ChoreoResult<Value> {
    use serde_json::Value as J;
    let mismatch = || ChoreoError::construction(format!("expected a {kind} value, got {json}"));
    let v = match (kind, json) {
        (ValueKind::Number, _) => Value::Number(length(json, base.map(|b| b.x))?),
        (ValueKind::Vec2, J::Number(_) | J::String(_)) => {
            let bx = length(json, base.map(|b| b.x))?;
            let by = length(json, base.map(|b| b.y))?;
            Value::Vec2(Vec2::new(bx, by))
        }
        (ValueKind::Vec2, J::Array(xs)) if xs.len() == 2 => Value::Vec2(Vec2::new(
            length(&xs[0], base.map(|b| b.x))?,
            length(&xs[1], base.map(|b| b.y))?,
        )),
        (ValueKind::Vec2, J::Object(o)) => {
            let get = |k: &str| o.get(k).ok_or_else(mismatch);
            Value::Vec2(Vec2::new(
                length(get("x")?, base.map(|b| b.x))?,
                length(get("y")?, base.map(|b| b.y))?,
            ))
        }
        (ValueKind::Color, _) => Value::Color(
            serde_json::from_value::<Color>(json.clone())
                .map_err(|e| ChoreoError::construction(format!("invalid color {json}: {e}")))?,
        ),
        (ValueKind::Bool, J::Bool(b)) => Value::Bool(*b),
        (ValueKind::Text, J::String(s)) => Value::Text(s.clone()),
        (ValueKind::Text, J::Number(n)) => Value::Text(n.to_string()),
        (ValueKind::Points, J::Array(xs)) => Value::Points(
            xs.iter()
                .map(|p| coerce(p, ValueKind::Vec2, None)?.as_vec2())
                .collect::<ChoreoResult<_>>()?,
        ),
        _ => return Err(mismatch()),
    };
    Ok(v)
}

/// Guess the kind of an untyped value (signals, constants inside expressions).
///
/// Strings that parse as colors (`#hex` or a color name) become colors; `[x, y]` is a vector; a
/// list of pairs is a point list.
pub(crate) fn infer(json: &serde_json::Value) -> ChoreoResult<Value> {
    use serde_json::Value as J;
    match json {
        J::Number(_) => coerce(json, ValueKind::Number, None),
        J::Bool(b) => Ok(Value::Bool(*b)),
        J::String(s) => Ok(match Color::parse(s) {
            Ok(c) => Value::Color(c),
            Err(_) => Value::Text(s.clone()),
        }),
        J::Array(xs) if xs.len() == 2 && xs.iter().all(J::is_number) => {
            coerce(json, ValueKind::Vec2, None)
        }
        J::Array(xs) if xs.iter().all(J::is_array) => coerce(json, ValueKind::Points, None),
        J::Array(_) | J::Object(_) => coerce(json, ValueKind::Color, None),
        J::Null => Err(ChoreoError::construction("null is not a value")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/build.rs"]
mod tests;
