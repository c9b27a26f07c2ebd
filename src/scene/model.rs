use crate::animation::ease::Ease;
use crate::foundation::core::{Canvas, Fps};
use crate::scene::property::NodeKind;
use crate::scene::style::StyleDef;
use crate::scene::variables::Variables;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON-facing project descriptor: shared variables and styles plus the scene registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDef {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default)]
    pub canvas: Canvas,
    #[serde(default)]
    pub fps: Fps,
    #[serde(default)]
    pub variables: Variables,
    /// Styles visible to every scene.
    #[serde(default)]
    pub styles: BTreeMap<String, StyleDef>,
    pub scenes: BTreeMap<String, SceneDef>,
    /// Scenes rendered by this project, in order. Empty means every scene.
    #[serde(default)]
    pub active: Vec<String>,
}

fn default_project_name() -> String {
    "project".to_owned()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneDef {
    /// Fill of the view root.
    #[serde(default)]
    pub background: Option<PropDef>,
    /// Named scalars such as transition lengths, usable wherever a `var` is accepted.
    #[serde(default)]
    pub constants: BTreeMap<String, ScalarDef>,
    #[serde(default)]
    pub styles: BTreeMap<String, StyleDef>,
    /// Created in order, after nodes and before node bindings.
    #[serde(default)]
    pub signals: Vec<SignalDef>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    /// Nodes saved before the script starts.
    #[serde(default)]
    pub save: Vec<String>,
    #[serde(default)]
    pub script: Vec<StepDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDef {
    pub kind: NodeKind,
    #[serde(default, rename = "ref")]
    pub name: Option<String>,
    #[serde(default)]
    pub style: NamesDef,
    #[serde(default)]
    pub children: Vec<NodeDef>,
    /// Every other key is a property.
    #[serde(flatten)]
    pub props: BTreeMap<String, PropDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDef {
    pub name: String,
    pub value: PropDef,
}

/// Property value as written in a scene file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropDef {
    /// Project variable or scene constant, with optional fallback.
    Var {
        var: String,
        #[serde(default)]
        default: Option<serde_json::Value>,
    },
    /// Derived value re-evaluated every frame.
    Bind { bind: ExprDef },
    /// Literal, coerced to the property's kind (`40` becomes `[40, 40]` for sizes).
    Literal(serde_json::Value),
}

/// Number literal or variable reference, used for durations and constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarDef {
    Number(f64),
    Var {
        var: String,
        #[serde(default)]
        default: Option<f64>,
        #[serde(default = "one")]
        scale: f64,
    },
}

fn one() -> f64 {
    1.0
}

impl From<f64> for ScalarDef {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprDef {
    Const(serde_json::Value),
    Var(String),
    Signal(String),
    /// `[node, field]`.
    Prop(String, String),
    Absolute(String),
    Add(Box<ExprDef>, Box<ExprDef>),
    Sub(Box<ExprDef>, Box<ExprDef>),
    Mul(Box<ExprDef>, Box<ExprDef>),
    Scale(Box<ExprDef>, f64),
    Vec2(Box<ExprDef>, Box<ExprDef>),
    X(Box<ExprDef>),
    Y(Box<ExprDef>),
    Points(Vec<ExprDef>),
}

/// One or more names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamesDef {
    One(String),
    Many(Vec<String>),
}

impl Default for NamesDef {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl NamesDef {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s.clone()],
            Self::Many(v) => v.clone(),
        }
    }
}

/// Script instruction as written in a scene file.
///
/// Targets are `"node.field"` (`"hero.opacity"`, `"hero.width"`), `"node.absolute_position"`, or
/// `"$signal"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDef {
    Tween(TweenDef),
    Set(SetDef),
    Bind(BindDef),
    Save(NamesDef),
    Restore(RestoreDef),
    Wait(ScalarDef),
    Chain(Vec<StepDef>),
    All(Vec<StepDef>),
    /// Start a step without waiting for it.
    Spawn(Box<StepDef>),
    Delay(DelayDef),
    Sequence(SequenceDef),
    /// Unrolled at build time.
    Repeat(RepeatDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TweenDef {
    pub target: String,
    pub to: PropDef,
    pub duration: ScalarDef,
    #[serde(default)]
    pub ease: Option<Ease>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDef {
    pub target: String,
    pub to: PropDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindDef {
    pub target: String,
    pub expr: ExprDef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestoreDef {
    pub node: NamesDef,
    pub duration: ScalarDef,
    #[serde(default)]
    pub ease: Option<Ease>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayDef {
    pub by: ScalarDef,
    pub step: Box<StepDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceDef {
    pub stagger: ScalarDef,
    pub steps: Vec<StepDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatDef {
    pub count: u32,
    pub step: Box<StepDef>,
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
