pub(crate) mod binding;
pub(crate) mod build;
pub(crate) mod graph;
pub(crate) mod model;
pub(crate) mod property;
pub(crate) mod style;
pub(crate) mod variables;
