use std::collections::HashMap;

use glam::Vec2;
use log::{debug, warn};
use rand::Rng;

use crate::{
    body::{Body, BodyKind},
    config::Config,
    decor::{self, Decoration},
    error::Result,
    graph::{Adjacency, Traversal},
    spring::{Spring, SpringKind},
    types::{BodyId, NodeId, SpringId},
    world::World,
};

/// One graph node together with the bodies and springs it owns.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub body: BodyId,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Branch springs to each child, parallel to `children`.
    pub springs: Vec<SpringId>,
    pub decor: Decoration,
}

/// A built tree: the physics world plus the node table indexed by [`NodeId`].
///
/// Slots for nodes unreachable from the root stay `None`.
pub struct Tree {
    world: World,
    nodes: Vec<Option<TreeNode>>,
    root: NodeId,
    traversal: Traversal,
}

/// Shared state threaded through the recursive instantiation.
struct Builder<'a, R: Rng> {
    adj: &'a Adjacency,
    traversal: &'a Traversal,
    cfg: &'a Config,
    seeds: Vec<Vec2>,
    world: World,
    nodes: Vec<Option<TreeNode>>,
    rng: &'a mut R,
}

impl<R: Rng> Builder<'_, R> {
    fn radius_at(&self, depth: usize) -> f32 {
        let l = &self.cfg.layout;
        (l.root_radius * l.radius_falloff.powi(depth as i32)).max(l.min_radius)
    }

    /// Creates the body for `id`, then recurses into its BFS-tree children.
    fn instantiate(&mut self, id: NodeId, parent: Option<NodeId>) -> BodyId {
        let depth = self.traversal.depth[id].unwrap_or(0);
        let pos = self.seeds[id];
        let radius = self.radius_at(depth);
        let body = if parent.is_none() {
            Body::pinned(pos, radius, BodyKind::Node)
        } else {
            Body::new(pos, radius, self.cfg.layout.density, BodyKind::Node)
        };
        let body = self.world.add_body(body);

        self.nodes[id] = Some(TreeNode {
            name: self.adj.name_of(id).to_string(),
            body,
            depth,
            parent,
            children: Vec::new(),
            springs: Vec::new(),
            decor: Decoration::default(),
        });

        let children: Vec<NodeId> = self.traversal.tree_children(self.adj, id).collect();
        for child in children {
            let child_body = self.instantiate(child, Some(id));
            let spring = self.world.add_spring(Spring::new(
                body,
                child_body,
                self.cfg.springs.branch,
                SpringKind::Branch,
            ));
            if let Some(node) = self.nodes[id].as_mut() {
                node.children.push(child);
                node.springs.push(spring);
            }
        }
        body
    }

    /// Adds twigs and leaves once every node body exists.
    fn decorate(&mut self) {
        let cfg = self.cfg;
        for id in self.traversal.order.iter().copied() {
            let Some(node) = self.nodes[id].as_ref() else {
                continue;
            };
            let Some(parent) = node.parent else {
                continue;
            };
            let body = node.body;
            let is_tip = node.children.is_empty();
            let outward = self.seeds[id] - self.seeds[parent];

            let added = if is_tip {
                decor::decorate_tip(
                    &mut self.world,
                    body,
                    outward,
                    &cfg.decor,
                    &cfg.springs,
                    &cfg.layout,
                    &mut *self.rng,
                )
            } else {
                decor::decorate_branch(
                    &mut self.world,
                    body,
                    outward,
                    &cfg.decor,
                    &cfg.springs,
                    &cfg.layout,
                    &mut *self.rng,
                )
            };
            if let Some(node) = self.nodes[id].as_mut() {
                node.decor = added;
            }
        }
    }
}

/// Initial positions: one row per depth, nodes of equal depth spread
/// around the root's x in visit order, plus random jitter.
fn seed_layout(traversal: &Traversal, cfg: &Config, rng: &mut impl Rng) -> Vec<Vec2> {
    let l = &cfg.layout;
    let mut per_depth: HashMap<usize, usize> = HashMap::new();
    for d in traversal.depth.iter().flatten() {
        *per_depth.entry(*d).or_default() += 1;
    }

    let mut seen: HashMap<usize, usize> = HashMap::new();
    let mut seeds = vec![l.root_pos; traversal.depth.len()];
    for &id in &traversal.order {
        let Some(d) = traversal.depth[id] else {
            continue;
        };
        if d == 0 {
            continue;
        }
        let slot = seen.entry(d).or_default();
        let count = per_depth[&d];
        let offset = *slot as f32 - (count as f32 - 1.0) * 0.5;
        *slot += 1;

        let jitter = if l.jitter > 0.0 {
            Vec2::new(
                rng.random_range(-l.jitter..=l.jitter),
                rng.random_range(-l.jitter..=l.jitter),
            )
        } else {
            Vec2::ZERO
        };
        seeds[id] = l.root_pos
            + Vec2::new(offset * l.sibling_spacing, d as f32 * l.level_spacing)
            + jitter;
    }
    seeds
}

/// Edges out of reached nodes that did not become BFS-tree edges.
fn skipped_edges(adj: &Adjacency, traversal: &Traversal) -> usize {
    let reached: usize = traversal
        .order
        .iter()
        .map(|&id| adj.children(id).len())
        .sum();
    reached - (traversal.order.len() - 1)
}

impl Tree {
    /// Builds the simulation for `adj` rooted at `root`.
    ///
    /// Every node reachable from `root` becomes one body; the root body is
    /// pinned. Each BFS-tree edge becomes a branch spring. Edges that would
    /// close a cycle or join a second parent are skipped.
    pub fn build(adj: &Adjacency, root: &str, cfg: &Config, rng: &mut impl Rng) -> Result<Self> {
        cfg.validate()?;
        let traversal = adj.bfs(root)?;
        let root_id = traversal.order[0];

        let skipped = skipped_edges(adj, &traversal);
        let unreached = adj.len() - traversal.order.len();
        if skipped > 0 {
            warn!("{skipped} edge(s) outside the BFS tree from `{root}` were skipped");
        }
        if unreached > 0 {
            warn!("{unreached} node(s) unreachable from `{root}`");
        }

        let seeds = seed_layout(&traversal, cfg, &mut *rng);
        let mut builder = Builder {
            adj,
            traversal: &traversal,
            cfg,
            seeds,
            world: World::new(cfg.forces),
            nodes: vec![None; adj.len()],
            rng,
        };
        builder.instantiate(root_id, None);
        if cfg.decor.enabled {
            builder.decorate();
        }

        let Builder { world, nodes, .. } = builder;
        debug!(
            "built tree from `{root}`: {} nodes, {} bodies, {} springs",
            traversal.order.len(),
            world.bodies().len(),
            world.springs().len()
        );

        Ok(Self {
            world,
            nodes,
            root: root_id,
            traversal,
        })
    }

    /// Builds the default edge list rooted at `"root"`.
    pub fn build_default(cfg: &Config, rng: &mut impl Rng) -> Result<Self> {
        Self::build(&Adjacency::default_tree(), "root", cfg, rng)
    }

    pub fn step(&mut self, dt: f32, sub_steps: usize) {
        self.world.step(dt, sub_steps);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Instantiated nodes in BFS order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> + '_ {
        self.traversal
            .order
            .iter()
            .filter_map(|&id| self.nodes[id].as_ref().map(|n| (id, n)))
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    pub fn find(&self, name: &str) -> Option<&TreeNode> {
        self.nodes().map(|(_, n)| n).find(|n| n.name == name)
    }

    pub fn node_count(&self) -> usize {
        self.traversal.order.len()
    }

    pub fn max_depth(&self) -> usize {
        self.traversal.max_depth()
    }

    pub fn depth_map(&self) -> HashMap<String, usize> {
        self.traversal.depth_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SceneError;
    use rand::{SeedableRng, rngs::StdRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn bare() -> Config {
        let mut cfg = Config::default();
        cfg.decor.enabled = false;
        cfg
    }

    #[test]
    fn one_body_per_node_and_one_spring_per_edge() {
        let adj = Adjacency::default_tree();
        let tree = Tree::build(&adj, "root", &bare(), &mut rng()).unwrap();

        assert_eq!(tree.node_count(), adj.len());
        assert_eq!(tree.world().bodies().len(), adj.len());
        assert_eq!(tree.world().springs().len(), adj.len() - 1);
        assert!(
            tree.world()
                .springs()
                .iter()
                .all(|s| s.kind == SpringKind::Branch)
        );
    }

    #[test]
    fn children_and_springs_follow_the_edge_list() {
        let tree = Tree::build_default(&bare(), &mut rng()).unwrap();
        let trunk = tree.find("trunk").unwrap();

        let names: Vec<&str> = trunk
            .children
            .iter()
            .map(|&c| tree.node(c).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["left", "middle", "right"]);
        assert_eq!(trunk.springs.len(), 3);

        for (&child, &spring) in trunk.children.iter().zip(&trunk.springs) {
            let s = tree.world().spring(spring);
            assert_eq!(s.a, trunk.body);
            assert_eq!(s.b, tree.node(child).unwrap().body);
        }
    }

    #[test]
    fn root_is_pinned_and_others_are_dynamic() {
        let tree = Tree::build_default(&bare(), &mut rng()).unwrap();
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.name, "root");
        assert!(tree.world().body(root.body).pinned);
        assert!(
            tree.nodes()
                .filter(|(id, _)| *id != tree.root())
                .all(|(_, n)| !tree.world().body(n.body).pinned)
        );
    }

    #[test]
    fn layout_rows_follow_depth() {
        let mut cfg = bare();
        cfg.layout.jitter = 0.0;
        let tree = Tree::build_default(&cfg, &mut rng()).unwrap();

        for (_, n) in tree.nodes() {
            let y = tree.world().body(n.body).pos.y;
            assert!((y - n.depth as f32 * cfg.layout.level_spacing).abs() < 1e-4);
        }

        // Three nodes at depth 2 are centered on the root.
        let xs: Vec<f32> = ["left", "middle", "right"]
            .iter()
            .map(|name| tree.world().body(tree.find(name).unwrap().body).pos.x)
            .collect();
        assert_eq!(xs, [-60.0, 0.0, 60.0]);
    }

    #[test]
    fn radius_shrinks_with_depth_down_to_minimum() {
        let tree = Tree::build_default(&bare(), &mut rng()).unwrap();
        let cfg = Config::default();
        let r = |name| tree.world().body(tree.find(name).unwrap().body).radius;

        assert_eq!(r("root"), cfg.layout.root_radius);
        assert!(r("trunk") < r("root"));
        assert!(r("right.upper.b") >= cfg.layout.min_radius);
    }

    #[test]
    fn decoration_attaches_leaves_to_every_tip() {
        let mut cfg = Config::default();
        cfg.decor.twig_chance = 0.0;
        let tree = Tree::build_default(&cfg, &mut rng()).unwrap();

        let mut tips = 0;
        for (id, n) in tree.nodes() {
            if id == tree.root() {
                assert!(n.decor.is_empty());
            } else if n.children.is_empty() {
                tips += 1;
                assert_eq!(n.decor.leaves.len(), cfg.decor.leaves_per_tip);
            } else {
                assert!(n.decor.is_empty());
            }
        }
        let leaves = tree
            .world()
            .bodies()
            .iter()
            .filter(|b| b.kind == BodyKind::Leaf)
            .count();
        assert_eq!(leaves, tips * cfg.decor.leaves_per_tip);

        let decor_bodies: usize = tree.nodes().map(|(_, n)| n.decor.bodies().count()).sum();
        assert_eq!(decor_bodies, tree.world().bodies().len() - tree.node_count());
        for (_, n) in tree.nodes() {
            assert!(n.decor.bodies().all(|b| tree.world().body(b).kind.is_decor()));
        }
    }

    #[test]
    fn same_seed_builds_same_scene() {
        let cfg = Config::default();
        let a = Tree::build_default(&cfg, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = Tree::build_default(&cfg, &mut StdRng::seed_from_u64(5)).unwrap();
        let pos = |t: &Tree| t.world().bodies().iter().map(|b| b.pos).collect::<Vec<_>>();
        assert_eq!(pos(&a), pos(&b));
    }

    #[test]
    fn cross_edges_are_skipped_and_unreachable_nodes_absent() {
        let adj =
            Adjacency::from_edges([("r", "a"), ("r", "b"), ("a", "c"), ("b", "c"), ("x", "y")])
                .unwrap();
        let tree = Tree::build(&adj, "r", &bare(), &mut rng()).unwrap();

        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.world().springs().len(), 3);
        assert_eq!(tree.find("c").unwrap().parent, adj.id_of("a"));
        assert!(tree.find("x").is_none());
        assert_eq!(tree.depth_map()["c"], 2);
    }

    #[test]
    fn skipped_edges_ignore_the_unreached_part() {
        let adj = Adjacency::from_edges([
            ("r", "a"),
            ("r", "b"),
            ("a", "c"),
            ("b", "c"),
            ("x", "y"),
            ("y", "z"),
        ])
        .unwrap();
        let traversal = adj.bfs("r").unwrap();
        assert_eq!(skipped_edges(&adj, &traversal), 1);

        let tree_only = Adjacency::default_tree();
        let traversal = tree_only.bfs("root").unwrap();
        assert_eq!(skipped_edges(&tree_only, &traversal), 0);
    }

    #[test]
    fn unknown_root_is_an_error() {
        let err = Tree::build(&Adjacency::default_tree(), "nope", &bare(), &mut rng());
        assert!(matches!(err, Err(SceneError::UnknownNode(_))));
    }

    #[test]
    fn simulated_tree_stays_finite_and_rooted() {
        let mut tree = Tree::build_default(&Config::default(), &mut rng()).unwrap();
        let root_body = tree.node(tree.root()).unwrap().body;
        let root_pos = tree.world().body(root_body).pos;

        for _ in 0..600 {
            tree.step(1.0 / 60.0, 4);
        }

        assert_eq!(tree.world().body(root_body).pos, root_pos);
        assert!(tree.world().bodies().iter().all(|b| b.pos.is_finite()));
        // Anti-gravity keeps the crown above the root.
        let tip = tree.find("right.upper.b").unwrap();
        assert!(tree.world().body(tip.body).pos.y > root_pos.y);
    }
}
