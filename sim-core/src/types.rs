/// Identifier for a node in a [`crate::graph::Adjacency`] and the
/// [`crate::tree::Tree`] built from it.
///
/// This is an index into the adjacency's name table, and is only meaningful
/// within the lifetime of a given adjacency.
pub type NodeId = usize;

/// Index of a body inside a [`crate::world::World`].
pub type BodyId = usize;

/// Index of a spring inside a [`crate::world::World`].
pub type SpringId = usize;
