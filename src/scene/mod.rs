pub(crate) mod graph;
pub(crate) mod shape;
