use crate::animation::value::{Value, kind_mismatch};
use crate::foundation::core::{Affine, Canvas, Point, Vec2};
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::foundation::ids::{NodeId, SignalId};
use crate::scene::binding::{self, Expr};
use crate::scene::property::{Field, NodeKind, PropKey};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Name of the implicit root node spanning the canvas.
pub const VIEW: &str = "view";

const MAX_BINDING_DEPTH: u32 = 64;

/// Storage for one property: a literal, or a rule recomputed on every read.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Literal(Value),
    Bound(Expr),
}

/// Copy of a node's resolved property values taken by a save.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub(crate) values: BTreeMap<PropKey, Value>,
}

impl Snapshot {
    pub fn get(&self, key: PropKey) -> Option<&Value> {
        self.values.get(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropKey, &Value)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}

#[derive(Clone, Debug)]
struct Node {
    name: Option<String>,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    props: BTreeMap<PropKey, Slot>,
    saved: SmallVec<[Snapshot; 2]>,
}

#[derive(Clone, Debug)]
struct Signal {
    name: String,
    slot: Slot,
}

/// Arena of shape nodes owned by one scene.
///
/// Node `0` is always the [`VIEW`] root: a rect the size of the canvas whose fill is the scene
/// background. Every other node descends from it.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    canvas: Canvas,
    nodes: Vec<Node>,
    names: BTreeMap<String, NodeId>,
    signals: Vec<Signal>,
    signal_names: BTreeMap<String, SignalId>,
}

impl SceneGraph {
    pub fn new(canvas: Canvas) -> Self {
        let mut graph = Self {
            canvas,
            nodes: Vec::new(),
            names: BTreeMap::new(),
            signals: Vec::new(),
            signal_names: BTreeMap::new(),
        };
        let mut props: BTreeMap<PropKey, Slot> = NodeKind::Rect
            .defaults()
            .into_iter()
            .map(|(k, v)| (k, Slot::Literal(v)))
            .collect();
        props.insert(PropKey::Size, Slot::Literal(Value::Vec2(canvas.size())));
        graph.nodes.push(Node {
            name: Some(VIEW.to_owned()),
            kind: NodeKind::Rect,
            parent: None,
            children: Vec::new(),
            props,
            saved: SmallVec::new(),
        });
        graph.names.insert(VIEW.to_owned(), NodeId(0));
        graph
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn view(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Node ids in declaration order, the view first.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    /// Add a node with library-default properties under `parent` (the view when `None`).
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        parent: Option<NodeId>,
        name: Option<&str>,
    ) -> ChoreoResult<NodeId> {
        let parent = parent.unwrap_or(self.view());
        self.check_node(parent)?;
        if let Some(name) = name {
            if self.names.contains_key(name) {
                return Err(ChoreoError::construction(format!(
                    "reference '{name}' is bound more than once"
                )));
            }
        }

        let id = u32::try_from(self.nodes.len())
            .map(NodeId)
            .map_err(|_| ChoreoError::construction("scene has too many nodes"))?;
        self.nodes.push(Node {
            name: name.map(str::to_owned),
            kind,
            parent: Some(parent),
            children: Vec::new(),
            props: kind
                .defaults()
                .into_iter()
                .map(|(k, v)| (k, Slot::Literal(v)))
                .collect(),
            saved: SmallVec::new(),
        });
        self.nodes[parent.idx()].children.push(id);
        if let Some(name) = name {
            self.names.insert(name.to_owned(), id);
        }
        Ok(id)
    }

    /// Dereference a named reference.
    pub fn node(&self, name: &str) -> ChoreoResult<NodeId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| ChoreoError::construction(format!("unbound reference '{name}'")))
    }

    /// Reference name of a node, or `#<index>` for anonymous nodes.
    pub fn node_name(&self, id: NodeId) -> String {
        match self.nodes.get(id.idx()).and_then(|n| n.name.as_deref()) {
            Some(name) => name.to_owned(),
            None => format!("#{}", id.0),
        }
    }

    pub fn kind(&self, id: NodeId) -> ChoreoResult<NodeKind> {
        Ok(self.node_ref(id)?.kind)
    }

    pub fn parent(&self, id: NodeId) -> ChoreoResult<Option<NodeId>> {
        Ok(self.node_ref(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> ChoreoResult<&[NodeId]> {
        Ok(&self.node_ref(id)?.children)
    }

    /// Properties carried by the node's kind, in key order.
    pub fn prop_keys(&self, id: NodeId) -> ChoreoResult<impl Iterator<Item = PropKey> + '_> {
        Ok(self.node_ref(id)?.props.keys().copied())
    }

    pub fn slot(&self, id: NodeId, prop: PropKey) -> ChoreoResult<&Slot> {
        let node = self.node_ref(id)?;
        node.props
            .get(&prop)
            .ok_or_else(|| self.missing_prop(id, prop))
    }

    /// Resolve a property (or component) to its current value.
    pub fn get(&self, id: NodeId, field: Field) -> ChoreoResult<Value> {
        self.get_at(id, field, 0)
    }

    /// Write a literal value, replacing any binding on the property.
    ///
    /// Writing one component of a bound vector freezes the other component at its current value.
    pub fn set(&mut self, id: NodeId, field: Field, value: Value) -> ChoreoResult<()> {
        let value = match field.axis {
            None => {
                expect_kind(field.prop.value_kind(), &value)?;
                value
            }
            Some(axis) => {
                let c = value.as_number()?;
                let whole = self.get(id, Field::whole(field.prop))?.as_vec2()?;
                Value::Vec2(axis.with(whole, c))
            }
        };
        let slot = self.slot_mut(id, field.prop)?;
        *slot = Slot::Literal(value);
        Ok(())
    }

    /// Attach a derived rule to a whole property.
    pub fn bind(&mut self, id: NodeId, prop: PropKey, expr: Expr) -> ChoreoResult<()> {
        let slot = self.slot_mut(id, prop)?;
        let previous = std::mem::replace(slot, Slot::Bound(expr));
        // Surface kind errors and cycles at bind time rather than on the next frame.
        let checked = self
            .get(id, Field::whole(prop))
            .and_then(|v| expect_kind(prop.value_kind(), &v));
        if checked.is_err() {
            *self.slot_mut(id, prop)? = previous;
        }
        checked
    }

    /// Resolved values of every property of a node.
    pub fn state(&self, id: NodeId) -> ChoreoResult<BTreeMap<PropKey, Value>> {
        let node = self.node_ref(id)?;
        node.props
            .keys()
            .map(|k| Ok((*k, self.get(id, Field::whole(*k))?)))
            .collect()
    }

    /// Scene-space transform of a node.
    pub fn absolute_transform(&self, id: NodeId) -> ChoreoResult<Affine> {
        self.absolute_transform_at(id, 0)
    }

    /// Scene-space position of a node's origin.
    pub fn absolute_position(&self, id: NodeId) -> ChoreoResult<Vec2> {
        Ok((self.absolute_transform(id)? * Point::ORIGIN).to_vec2())
    }

    /// Move a node so its origin lands on `world`, expressed in its parent's space.
    pub fn set_absolute_position(&mut self, id: NodeId, world: Vec2) -> ChoreoResult<()> {
        let local = self.world_to_parent_local(id, world, 0)?;
        self.set(id, Field::whole(PropKey::Position), Value::Vec2(local))
    }

    /// Push a copy of the node's current values onto its save stack.
    pub fn save(&mut self, id: NodeId) -> ChoreoResult<()> {
        let values = self.state(id)?;
        self.node_mut(id)?.saved.push(Snapshot { values });
        Ok(())
    }

    /// Pop the most recent unconsumed snapshot.
    pub fn take_snapshot(&mut self, id: NodeId) -> ChoreoResult<Snapshot> {
        let name = self.node_name(id);
        self.node_mut(id)?.saved.pop().ok_or_else(|| {
            ChoreoError::authoring(format!("restore of '{name}' without a matching save"))
        })
    }

    /// Number of unconsumed snapshots on the node's save stack.
    pub fn saved_depth(&self, id: NodeId) -> ChoreoResult<usize> {
        Ok(self.node_ref(id)?.saved.len())
    }

    pub fn add_signal(&mut self, name: &str, initial: Slot) -> ChoreoResult<SignalId> {
        if self.signal_names.contains_key(name) {
            return Err(ChoreoError::construction(format!(
                "signal '{name}' is declared more than once"
            )));
        }
        let id = u32::try_from(self.signals.len())
            .map(SignalId)
            .map_err(|_| ChoreoError::construction("scene has too many signals"))?;
        self.signals.push(Signal {
            name: name.to_owned(),
            slot: initial,
        });
        self.signal_names.insert(name.to_owned(), id);
        if let Err(e) = self.get_signal(id) {
            self.signals.pop();
            self.signal_names.remove(name);
            return Err(e);
        }
        Ok(id)
    }

    pub fn signal(&self, name: &str) -> ChoreoResult<SignalId> {
        self.signal_names
            .get(name)
            .copied()
            .ok_or_else(|| ChoreoError::construction(format!("unbound signal '{name}'")))
    }

    pub fn signal_name(&self, id: SignalId) -> String {
        self.signals
            .get(id.idx())
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("${}", id.0))
    }

    pub fn get_signal(&self, id: SignalId) -> ChoreoResult<Value> {
        self.get_signal_at(id, 0)
    }

    /// Overwrite a signal with a literal, keeping its value kind.
    pub fn set_signal(&mut self, id: SignalId, value: Value) -> ChoreoResult<()> {
        let current = self.get_signal(id)?;
        expect_kind(current.kind(), &value)?;
        self.signal_mut(id)?.slot = Slot::Literal(value);
        Ok(())
    }

    pub fn bind_signal(&mut self, id: SignalId, expr: Expr) -> ChoreoResult<()> {
        let kind = self.get_signal(id)?.kind();
        let previous = std::mem::replace(&mut self.signal_mut(id)?.slot, Slot::Bound(expr));
        match self.get_signal(id).and_then(|v| expect_kind(kind, &v)) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.signal_mut(id)?.slot = previous;
                Err(e)
            }
        }
    }

    /// Evaluate a derived expression against the current state.
    pub fn eval(&self, expr: &Expr) -> ChoreoResult<Value> {
        self.eval_at(expr, 0)
    }

    fn eval_at(&self, expr: &Expr, depth: u32) -> ChoreoResult<Value> {
        if depth > MAX_BINDING_DEPTH {
            return Err(ChoreoError::authoring(
                "binding cycle: derived properties reference each other",
            ));
        }
        let d = depth + 1;
        match expr {
            Expr::Const(v) => Ok(v.clone()),
            Expr::Signal(id) => self.get_signal_at(*id, d),
            Expr::Prop { node, field } => self.get_at(*node, *field, d),
            Expr::Absolute(node) => {
                Ok(Value::Vec2((self.absolute_transform_at(*node, d)? * Point::ORIGIN).to_vec2()))
            }
            Expr::Add(a, b) => binding::add(self.eval_at(a, d)?, self.eval_at(b, d)?),
            Expr::Sub(a, b) => binding::sub(self.eval_at(a, d)?, self.eval_at(b, d)?),
            Expr::Mul(a, b) => binding::mul(self.eval_at(a, d)?, self.eval_at(b, d)?),
            Expr::Scale(a, f) => binding::scale(self.eval_at(a, d)?, *f),
            Expr::Vec2(x, y) => binding::make_vec2(self.eval_at(x, d)?, self.eval_at(y, d)?),
            Expr::Component(v, axis) => binding::component(self.eval_at(v, d)?, *axis),
            Expr::Points(ps) => binding::make_points(
                ps.iter()
                    .map(|p| self.eval_at(p, d))
                    .collect::<ChoreoResult<Vec<_>>>()?,
            ),
            Expr::ToLocal { node, world } => {
                let world = self.eval_at(world, d)?.as_vec2()?;
                Ok(Value::Vec2(self.world_to_parent_local(*node, world, d)?))
            }
        }
    }

    fn get_at(&self, id: NodeId, field: Field, depth: u32) -> ChoreoResult<Value> {
        let whole = match self.slot(id, field.prop)? {
            Slot::Literal(v) => v.clone(),
            Slot::Bound(expr) => self.eval_at(expr, depth)?,
        };
        match field.axis {
            None => Ok(whole),
            Some(axis) => Ok(Value::Number(axis.get(whole.as_vec2()?))),
        }
    }

    fn get_signal_at(&self, id: SignalId, depth: u32) -> ChoreoResult<Value> {
        let signal = self
            .signals
            .get(id.idx())
            .ok_or_else(|| ChoreoError::construction(format!("unbound signal ${}", id.0)))?;
        match &signal.slot {
            Slot::Literal(v) => Ok(v.clone()),
            Slot::Bound(expr) => self.eval_at(expr, depth),
        }
    }

    fn local_transform_at(&self, id: NodeId, depth: u32) -> ChoreoResult<Affine> {
        let pos = self.get_at(id, Field::whole(PropKey::Position), depth)?.as_vec2()?;
        let rot = self.get_at(id, Field::whole(PropKey::Rotation), depth)?.as_number()?;
        let scale = self.get_at(id, Field::whole(PropKey::Scale), depth)?.as_vec2()?;
        Ok(Affine::translate(pos)
            * Affine::rotate(rot.to_radians())
            * Affine::scale_non_uniform(scale.x, scale.y))
    }

    fn absolute_transform_at(&self, id: NodeId, depth: u32) -> ChoreoResult<Affine> {
        let mut chain = Vec::new();
        let mut cur = Some(id);
        while let Some(n) = cur {
            chain.push(n);
            cur = self.node_ref(n)?.parent;
        }
        let mut out = Affine::IDENTITY;
        for n in chain.into_iter().rev() {
            out = out * self.local_transform_at(n, depth)?;
        }
        Ok(out)
    }

    fn world_to_parent_local(&self, id: NodeId, world: Vec2, depth: u32) -> ChoreoResult<Vec2> {
        let Some(parent) = self.node_ref(id)?.parent else {
            return Ok(world);
        };
        let parent_tf = self.absolute_transform_at(parent, depth)?;
        if parent_tf.determinant().abs() < 1e-12 {
            return Err(ChoreoError::authoring(format!(
                "cannot place '{}' inside a parent with zero scale",
                self.node_name(id)
            )));
        }
        Ok((parent_tf.inverse() * world.to_point()).to_vec2())
    }

    fn check_node(&self, id: NodeId) -> ChoreoResult<()> {
        self.node_ref(id).map(|_| ())
    }

    fn node_ref(&self, id: NodeId) -> ChoreoResult<&Node> {
        self.nodes.get(id.idx()).ok_or_else(|| {
            ChoreoError::authoring(format!("node #{} was never added to the scene", id.0))
        })
    }

    fn node_mut(&mut self, id: NodeId) -> ChoreoResult<&mut Node> {
        self.nodes.get_mut(id.idx()).ok_or_else(|| {
            ChoreoError::authoring(format!("node #{} was never added to the scene", id.0))
        })
    }

    fn slot_mut(&mut self, id: NodeId, prop: PropKey) -> ChoreoResult<&mut Slot> {
        if !self.node_ref(id)?.props.contains_key(&prop) {
            return Err(self.missing_prop(id, prop));
        }
        let node = self.node_mut(id)?;
        node.props
            .get_mut(&prop)
            .ok_or_else(|| ChoreoError::authoring(format!("missing property '{prop}'")))
    }

    fn signal_mut(&mut self, id: SignalId) -> ChoreoResult<&mut Signal> {
        self.signals
            .get_mut(id.idx())
            .ok_or_else(|| ChoreoError::construction(format!("unbound signal ${}", id.0)))
    }

    fn missing_prop(&self, id: NodeId, prop: PropKey) -> ChoreoError {
        match self.nodes.get(id.idx()) {
            Some(node) => ChoreoError::authoring(format!(
                "{:?} node '{}' has no property '{prop}'",
                node.kind,
                self.node_name(id)
            )),
            None => ChoreoError::authoring(format!("node #{} was never added to the scene", id.0)),
        }
    }
}

fn expect_kind(expected: crate::animation::value::ValueKind, v: &Value) -> ChoreoResult<()> {
    if v.kind() == expected {
        Ok(())
    } else {
        Err(kind_mismatch(expected, v.kind()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
