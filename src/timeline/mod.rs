pub(crate) mod ops;
pub(crate) mod player;
pub(crate) mod sink;
pub(crate) mod step;
pub(crate) mod task;
