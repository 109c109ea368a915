//! Static parent -> children adjacency and breadth-first depth labeling.

use std::collections::{HashMap, VecDeque};

use crate::{
    error::{Result, SceneError},
    types::NodeId,
};

/// The fixed edge list drawn by the viewer.
pub const DEFAULT_EDGES: &[(&str, &str)] = &[
    ("root", "trunk"),
    ("trunk", "left"),
    ("trunk", "middle"),
    ("trunk", "right"),
    ("left", "left.upper"),
    ("left", "left.lower"),
    ("left.upper", "left.upper.tip"),
    ("left.upper", "left.upper.fork"),
    ("left.lower", "left.lower.tip"),
    ("middle", "middle.a"),
    ("middle", "middle.b"),
    ("middle", "middle.c"),
    ("middle.a", "middle.a.tip"),
    ("middle.c", "middle.c.left"),
    ("middle.c", "middle.c.right"),
    ("right", "right.upper"),
    ("right", "right.lower"),
    ("right.upper", "right.upper.a"),
    ("right.upper", "right.upper.b"),
    ("right.upper", "right.upper.c"),
    ("right.lower", "right.lower.tip"),
];

/// Directed adjacency with string names interned to dense [`NodeId`]s.
///
/// Ids are assigned in order of first appearance in the edge list, so the
/// parent of the first edge is always id `0`.
#[derive(Debug, Clone, Default)]
pub struct Adjacency {
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    children: Vec<Vec<NodeId>>,
}

/// Result of a breadth-first traversal from a root.
#[derive(Debug, Clone)]
pub struct Traversal {
    /// Reached nodes in visit order; every reachable node appears once.
    pub order: Vec<NodeId>,
    /// Depth from the root, `None` for unreachable nodes.
    pub depth: Vec<Option<usize>>,
    /// BFS parent of each reached node; `None` for the root and unreachable nodes.
    pub parent: Vec<Option<NodeId>>,
    names: Vec<String>,
}

impl Adjacency {
    /// Builds an adjacency from `(parent, child)` pairs.
    ///
    /// Repeated edges are stored once. A node listed as its own child is
    /// rejected with [`SceneError::SelfLoop`].
    pub fn from_edges<'a, I>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut adj = Self::default();
        for (parent, child) in edges {
            if parent == child {
                return Err(SceneError::SelfLoop(parent.to_string()));
            }
            let p = adj.intern(parent);
            let c = adj.intern(child);
            if !adj.children[p].contains(&c) {
                adj.children[p].push(c);
            }
        }
        Ok(adj)
    }

    pub fn default_tree() -> Self {
        // DEFAULT_EDGES has no self-loops, so this cannot fail.
        Self::from_edges(DEFAULT_EDGES.iter().copied()).unwrap_or_default()
    }

    fn intern(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.children.push(Vec::new());
        id
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn name_of(&self, id: NodeId) -> &str {
        &self.names[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id]
    }

    pub fn edge_count(&self) -> usize {
        self.children.iter().map(Vec::len).sum()
    }

    /// Breadth-first traversal from `root`.
    ///
    /// Each node is labeled the first time it is discovered, which makes its
    /// depth the shortest-path distance from `root`.
    pub fn bfs(&self, root: &str) -> Result<Traversal> {
        let root_id = self
            .id_of(root)
            .ok_or_else(|| SceneError::UnknownNode(root.to_string()))?;

        let n = self.len();
        let mut depth = vec![None; n];
        let mut parent = vec![None; n];
        let mut order = Vec::with_capacity(n);
        let mut queue = VecDeque::with_capacity(n);

        depth[root_id] = Some(0);
        queue.push_back(root_id);

        while let Some(id) = queue.pop_front() {
            order.push(id);
            let next = depth[id].map_or(0, |d| d + 1);
            for &child in &self.children[id] {
                if depth[child].is_none() {
                    depth[child] = Some(next);
                    parent[child] = Some(id);
                    queue.push_back(child);
                }
            }
        }

        Ok(Traversal {
            order,
            depth,
            parent,
            names: self.names.clone(),
        })
    }
}

impl Traversal {
    /// Node name -> depth for every reached node.
    pub fn depth_map(&self) -> HashMap<String, usize> {
        self.order
            .iter()
            .filter_map(|&id| self.depth[id].map(|d| (self.names[id].clone(), d)))
            .collect()
    }

    pub fn is_reached(&self, id: NodeId) -> bool {
        self.depth[id].is_some()
    }

    /// Children of `id` in the BFS tree, in adjacency order.
    pub fn tree_children<'a>(
        &'a self,
        adj: &'a Adjacency,
        id: NodeId,
    ) -> impl Iterator<Item = NodeId> + 'a {
        adj.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.parent[c] == Some(id))
    }

    pub fn max_depth(&self) -> usize {
        self.depth.iter().flatten().copied().max().unwrap_or(0)
    }
}
