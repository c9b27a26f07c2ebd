#![forbid(unsafe_code)]

//! Timeline choreography for 2D scene graphs.
//!
//! A [`Scene`] is a static tree of named shape nodes plus a script of [`Step`]s. The [`Player`]
//! drives the script along one logical clock: chained steps run back-to-back, `all` groups run
//! side by side, `save`/`restore` push and pop per-node snapshots, and bound properties are
//! re-evaluated on every read. Sampled property changes are streamed to an [`UpdateSink`].
//!
//! Scenes are usually described in JSON ([`ProjectDef`]) and built with [`Project::build_scene`],
//! but the same steps can be assembled directly with the [`ops`] helpers.

mod animation;
mod foundation;
mod project;
mod scene;
mod style;
mod timeline;

pub use animation::ease::Ease;
pub use animation::lerp::Lerp;
pub use animation::value::{Value, ValueKind};
pub use foundation::core::{Affine, Canvas, Fps, FrameIndex, FrameRange, TIME_EPSILON, Vec2};
pub use foundation::error::{ChoreoError, ChoreoResult};
pub use foundation::ids::{NodeId, SignalId};
pub use project::Project;
pub use scene::binding::Expr;
pub use scene::build::{BuildEnv, Scene, build};
pub use scene::graph::{SceneGraph, Slot, Snapshot, VIEW};
pub use scene::model::{
    BindDef, DelayDef, ExprDef, NamesDef, NodeDef, ProjectDef, PropDef, RepeatDef, RestoreDef,
    ScalarDef, SceneDef, SequenceDef, SetDef, SignalDef, StepDef, TweenDef,
};
pub use scene::property::{Axis, Field, NodeKind, PropKey};
pub use scene::style::StyleDef;
pub use scene::variables::{VarDef, Variables};
pub use style::color::Color;
pub use timeline::player::{PlayState, Player, PlayerOpts, RenderStats};
pub use timeline::sink::{
    DigestSink, InMemorySink, JsonLinesSink, PropertyUpdate, SinkConfig, UpdateSink,
};
pub use timeline::step::{EndValue, Extent, Step, Target, Tween};

/// Step constructors: `chain`, `all`, `tween`, `save`, `restore`, ...
pub mod ops {
    pub use crate::timeline::ops::*;
}
