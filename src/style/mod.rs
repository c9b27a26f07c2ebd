pub(crate) mod color;
