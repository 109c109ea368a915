//! Twig and leaf placement around tree nodes.
//!
//! Decorative bodies hang off a node on short, soft springs. Tips get a fan
//! of leaves around the outward direction; branch nodes may sprout a twig
//! with a single leaf at its end.

use glam::Vec2;
use rand::Rng;

use crate::{
    body::{Body, BodyKind},
    config::{DecorConfig, LayoutConfig, SpringConfig},
    spring::{Spring, SpringKind},
    types::BodyId,
    world::World,
};

/// Bodies added by one decoration call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub twigs: Vec<BodyId>,
    pub leaves: Vec<BodyId>,
}

impl Decoration {
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.twigs.iter().chain(self.leaves.iter()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.twigs.is_empty() && self.leaves.is_empty()
    }
}

fn jitter(rng: &mut impl Rng, spread: f32) -> f32 {
    if spread > 0.0 {
        rng.random_range(-spread..=spread)
    } else {
        0.0
    }
}

/// Hangs a new body off `anchor` along `dir`, at the template's rest length.
///
/// The body kind follows the spring kind.
fn sprout(
    world: &mut World,
    anchor: BodyId,
    dir: Vec2,
    radius: f32,
    density: f32,
    template: Spring,
) -> BodyId {
    let kind = match template.kind {
        SpringKind::Twig => BodyKind::Twig,
        SpringKind::Leaf | SpringKind::Branch => BodyKind::Leaf,
    };
    let pos = world.body(anchor).pos + dir * template.length;
    let id = world.add_body(Body::new(pos, radius, density, kind));
    world.add_spring(Spring {
        a: anchor,
        b: id,
        ..template
    });
    id
}

/// Adds a fan of `leaves_per_tip` leaves around `outward` at a terminal node.
pub fn decorate_tip(
    world: &mut World,
    node: BodyId,
    outward: Vec2,
    decor: &DecorConfig,
    springs: &SpringConfig,
    layout: &LayoutConfig,
    rng: &mut impl Rng,
) -> Decoration {
    let mut out = Decoration::default();
    let base = outward.try_normalize().unwrap_or(Vec2::Y);
    let n = decor.leaves_per_tip;
    let template = Spring::new(node, node, springs.leaf, SpringKind::Leaf);

    for i in 0..n {
        // Centered fan: offsets -(n-1)/2 .. (n-1)/2 steps of `leaf_fan`.
        let step = i as f32 - (n as f32 - 1.0) * 0.5;
        let angle = step * decor.leaf_fan + jitter(rng, decor.leaf_spread);
        let dir = Vec2::from_angle(angle).rotate(base);
        let leaf = sprout(
            world,
            node,
            dir,
            decor.leaf_radius,
            layout.density,
            template.clone(),
        );
        out.leaves.push(leaf);
    }
    out
}

/// With probability `twig_chance`, adds a twig off to one side of a branch
/// node and a leaf at the twig's end.
pub fn decorate_branch(
    world: &mut World,
    node: BodyId,
    outward: Vec2,
    decor: &DecorConfig,
    springs: &SpringConfig,
    layout: &LayoutConfig,
    rng: &mut impl Rng,
) -> Decoration {
    let mut out = Decoration::default();
    if !rng.random_bool(f64::from(decor.twig_chance.clamp(0.0, 1.0))) {
        return out;
    }

    let base = outward.try_normalize().unwrap_or(Vec2::Y);
    let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let angle = side * decor.twig_angle + jitter(rng, decor.twig_spread);
    let dir = Vec2::from_angle(angle).rotate(base);

    let twig = sprout(
        world,
        node,
        dir,
        decor.twig_radius,
        layout.density,
        Spring::new(node, node, springs.twig, SpringKind::Twig),
    );
    out.twigs.push(twig);

    let leaf = sprout(
        world,
        twig,
        dir,
        decor.leaf_radius,
        layout.density,
        Spring::new(twig, twig, springs.leaf, SpringKind::Leaf),
    );
    out.leaves.push(leaf);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceConfig;
    use rand::{SeedableRng, rngs::StdRng};

    fn world_with_node() -> (World, BodyId) {
        let mut w = World::new(ForceConfig::default());
        let id = w.add_body(Body::new(Vec2::new(5.0, 5.0), 4.0, 0.01, BodyKind::Node));
        (w, id)
    }

    #[test]
    fn tip_gets_a_fan_of_leaves_at_leaf_length() {
        let (mut w, node) = world_with_node();
        let decor = DecorConfig::default();
        let springs = SpringConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        let d = decorate_tip(
            &mut w,
            node,
            Vec2::Y,
            &decor,
            &springs,
            &LayoutConfig::default(),
            &mut rng,
        );

        assert_eq!(d.leaves.len(), decor.leaves_per_tip);
        assert!(d.twigs.is_empty());
        for &leaf in &d.leaves {
            let b = w.body(leaf);
            assert_eq!(b.kind, BodyKind::Leaf);
            let dist = (b.pos - w.body(node).pos).length();
            assert!((dist - springs.leaf.length).abs() < 1e-3);
            // Fan stays on the outward side.
            assert!(b.pos.y > w.body(node).pos.y);
        }
        assert_eq!(w.springs().len(), decor.leaves_per_tip);
        assert!(w.springs().iter().all(|s| s.a == node && s.kind == SpringKind::Leaf));
    }

    #[test]
    fn branch_twig_carries_one_leaf() {
        let (mut w, node) = world_with_node();
        let decor = DecorConfig {
            twig_chance: 1.0,
            ..DecorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(2);

        let d = decorate_branch(
            &mut w,
            node,
            Vec2::X,
            &decor,
            &SpringConfig::default(),
            &LayoutConfig::default(),
            &mut rng,
        );

        assert_eq!(d.twigs.len(), 1);
        assert_eq!(d.leaves.len(), 1);
        let twig_spring = w.spring(0);
        let leaf_spring = w.spring(1);
        assert_eq!((twig_spring.a, twig_spring.b), (node, d.twigs[0]));
        assert_eq!((leaf_spring.a, leaf_spring.b), (d.twigs[0], d.leaves[0]));
        assert_eq!(twig_spring.kind, SpringKind::Twig);
    }

    #[test]
    fn zero_chance_adds_nothing() {
        let (mut w, node) = world_with_node();
        let decor = DecorConfig {
            twig_chance: 0.0,
            ..DecorConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);

        let d = decorate_branch(
            &mut w,
            node,
            Vec2::Y,
            &decor,
            &SpringConfig::default(),
            &LayoutConfig::default(),
            &mut rng,
        );

        assert!(d.is_empty());
        assert_eq!(w.bodies().len(), 1);
    }

    #[test]
    fn same_seed_same_leaves() {
        let place = |seed| {
            let (mut w, node) = world_with_node();
            let mut rng = StdRng::seed_from_u64(seed);
            decorate_tip(
                &mut w,
                node,
                Vec2::new(1.0, 1.0),
                &DecorConfig::default(),
                &SpringConfig::default(),
                &LayoutConfig::default(),
                &mut rng,
            );
            w.bodies().iter().map(|b| b.pos).collect::<Vec<_>>()
        };
        assert_eq!(place(11), place(11));
        assert_ne!(place(11), place(12));
    }
}
