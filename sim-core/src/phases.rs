//! Per-tick phases of the wobble simulation.
//!
//! One sub-step of [`crate::world::World::step`] runs:
//! 1. the force callback, by default [`apply_forces`], which chains
//!    [`constant_force_phase`], [`repulsion_phase`], [`center_pull_phase`]
//!    and [`damping_phase`];
//! 2. [`spring_phase`]: branch, twig and leaf springs plus the mouse spring;
//! 3. [`integrate_phase`]: semi-implicit Euler on every body;
//! 4. [`collision_phase`]: pairwise circle separation.
//!
//! Force phases only add into a [`ForceBuffer`]; they never move bodies.

use glam::Vec2;

use crate::{
    body::{Body, BodyKind, CollisionFilter},
    config::ForceConfig,
    force_buffer::ForceBuffer,
    spring::{MouseSpring, Spring},
};

/// Signature of the per-tick force callback held by the world.
pub type ForceFn = fn(&[Body], &ForceConfig, &mut ForceBuffer);

/// Default force callback installed by [`crate::world::World::new`].
///
/// Runs, in order:
///
/// 1. [`constant_force_phase`]
/// 2. [`repulsion_phase`]
/// 3. [`center_pull_phase`]
/// 4. [`damping_phase`]
///
/// The buffer is expected to be sized and cleared by the caller.
///
/// ### Parameters
/// - `bodies` - Every body in the world; only read access is required.
/// - `cfg` - Global force constants.
/// - `acc` - Per-body force accumulator.
pub fn apply_forces(bodies: &[Body], cfg: &ForceConfig, acc: &mut ForceBuffer) {
    constant_force_phase(bodies, cfg, acc);
    repulsion_phase(bodies, cfg, acc);
    center_pull_phase(bodies, cfg, acc);
    damping_phase(bodies, cfg, acc);
}

/// Applies anti-gravity to tree nodes and gravity to twigs and leaves.
///
/// World space is y-up, so anti-gravity pushes toward +y.
pub fn constant_force_phase(bodies: &[Body], cfg: &ForceConfig, acc: &mut ForceBuffer) {
    for (id, b) in bodies.iter().enumerate().filter(|(_, b)| !b.pinned) {
        let accel = match b.kind {
            BodyKind::Node => Vec2::new(0.0, cfg.anti_gravity),
            BodyKind::Twig | BodyKind::Leaf => Vec2::new(0.0, -cfg.gravity),
        };
        acc.add(id, accel * b.mass);
    }
}

/// Inverse-square force of magnitude `strength / dist^2` pushing `a` away from `b`.
///
/// The distance is floored at `repulsion_min_distance` and the magnitude capped at
/// `repulsion_max_force`, so coincident or very close bodies stay finite.
pub fn repulsion_force(a: Vec2, b: Vec2, cfg: &ForceConfig) -> Vec2 {
    let delta = a - b;
    let dist = delta.length().max(cfg.repulsion_min_distance);
    let magnitude = (cfg.repulsion / (dist * dist)).min(cfg.repulsion_max_force);
    // Coincident bodies have no direction; nudge along +x.
    let dir = delta.try_normalize().unwrap_or(Vec2::X);
    dir * magnitude
}

/// Pairwise repulsion between tree nodes.
///
/// For every unordered pair of [`BodyKind::Node`] bodies:
///
/// 1. Computes the clamped inverse-square push with [`repulsion_force`].
/// 2. Adds it to the first body and its negation to the second.
/// 3. Skips the add for a pinned body, so the root never drifts.
///
/// Twigs and leaves neither push nor are pushed. A zero `cfg.repulsion`
/// skips the phase entirely.
///
/// ### Parameters
/// - `bodies` - Every body in the world.
/// - `cfg` - Provides `repulsion`, `repulsion_min_distance` and
///   `repulsion_max_force`.
/// - `acc` - Per-body force accumulator.
pub fn repulsion_phase(bodies: &[Body], cfg: &ForceConfig, acc: &mut ForceBuffer) {
    if cfg.repulsion == 0.0 {
        return;
    }
    for i in 0..bodies.len() {
        if bodies[i].kind != BodyKind::Node {
            continue;
        }
        for j in (i + 1)..bodies.len() {
            if bodies[j].kind != BodyKind::Node {
                continue;
            }
            let f = repulsion_force(bodies[i].pos, bodies[j].pos, cfg);
            if !bodies[i].pinned {
                acc.add(i, f);
            }
            if !bodies[j].pinned {
                acc.add(j, -f);
            }
        }
    }
}

/// Horizontal pull of every dynamic body toward `center_x`.
pub fn center_pull_phase(bodies: &[Body], cfg: &ForceConfig, acc: &mut ForceBuffer) {
    for (id, b) in bodies.iter().enumerate().filter(|(_, b)| !b.pinned) {
        let dx = b.pos.x - cfg.center_x;
        acc.add(id, Vec2::new(-dx * cfg.center_pull * b.mass, 0.0));
    }
}

/// Linear velocity damping.
pub fn damping_phase(bodies: &[Body], cfg: &ForceConfig, acc: &mut ForceBuffer) {
    for (id, b) in bodies.iter().enumerate().filter(|(_, b)| !b.pinned) {
        acc.add(id, -b.vel * cfg.damping * b.mass);
    }
}

/// Adds spring forces, including the optional pointer spring.
///
/// 1. Each [`Spring`] adds [`Spring::force_on_a`] to body `a` and the
///    negation to body `b`, so springs never change total momentum.
/// 2. If the pointer holds a body, [`MouseSpring::force`] is added to it
///    alone.
///
/// Forces land on pinned bodies too; [`integrate_phase`] ignores them there.
///
/// ### Parameters
/// - `bodies` - Every body in the world.
/// - `springs` - Branch, twig and leaf springs.
/// - `mouse` - The pointer spring, if a body is grabbed.
/// - `acc` - Per-body force accumulator.
pub fn spring_phase(
    bodies: &[Body],
    springs: &[Spring],
    mouse: Option<&MouseSpring>,
    acc: &mut ForceBuffer,
) {
    for s in springs {
        let f = s.force_on_a(bodies);
        acc.add(s.a, f);
        acc.add(s.b, -f);
    }
    if let Some(m) = mouse {
        acc.add(m.body, m.force(bodies));
    }
}

/// Moves every body by the accumulated forces over `dt`.
///
/// Delegates to [`Body::integrate`] (semi-implicit Euler: velocity first,
/// then position from the new velocity). Pinned bodies stay put.
///
/// ### Parameters
/// - `bodies` - Every body in the world; positions and velocities change.
/// - `acc` - Forces gathered by the force callback and [`spring_phase`].
/// - `dt` - Sub-step length in seconds.
pub fn integrate_phase(bodies: &mut [Body], acc: &ForceBuffer, dt: f32) {
    for (id, b) in bodies.iter_mut().enumerate() {
        b.integrate(dt, acc.get(id));
    }
}

/// Separates overlapping circles whose filters allow a collision.
///
/// For every pair that passes [`CollisionFilter::can_collide`]:
///
/// 1. Skips it if both bodies are pinned or the circles do not overlap.
/// 2. Pushes the bodies apart along the contact normal, splitting the
///    overlap by inverse mass.
/// 3. Removes the approaching part of the relative normal velocity.
///
/// A non-finite distance counts as no contact so one diverged body does
/// not poison its neighbors.
///
/// ### Returns
/// The number of contacts resolved.
pub fn collision_phase(bodies: &mut [Body]) -> usize {
    let mut contacts = 0;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (left, right) = bodies.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            if !CollisionFilter::can_collide(&a.filter, &b.filter) {
                continue;
            }
            let inv_sum = a.inv_mass + b.inv_mass;
            if inv_sum == 0.0 {
                continue;
            }

            let delta = b.pos - a.pos;
            let min_dist = a.radius + b.radius;
            let d2 = delta.length_squared();
            if d2.is_nan() || d2 >= min_dist * min_dist {
                continue;
            }

            let dist = d2.sqrt();
            let normal = if dist > f32::EPSILON {
                delta / dist
            } else {
                Vec2::X
            };
            let overlap = min_dist - dist;

            a.pos -= normal * overlap * (a.inv_mass / inv_sum);
            b.pos += normal * overlap * (b.inv_mass / inv_sum);

            let approaching = (b.vel - a.vel).dot(normal);
            if approaching < 0.0 {
                let impulse = -approaching / inv_sum;
                a.vel -= normal * impulse * a.inv_mass;
                b.vel += normal * impulse * b.inv_mass;
            }
            contacts += 1;
        }
    }
    contacts
}
