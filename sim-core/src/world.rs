//! Simulation state: bodies, springs and the per-tick force callback.

use glam::Vec2;
use log::warn;

use crate::{
    body::Body,
    config::ForceConfig,
    force_buffer::ForceBuffer,
    phases::{self, ForceFn},
    spring::{MouseSpring, Spring},
    types::{BodyId, SpringId},
};

pub struct World {
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    mouse: Option<MouseSpring>,
    pub forces: ForceConfig,
    force_hook: ForceFn,
    acc: ForceBuffer,
    last_contacts: usize,
}

impl World {
    pub fn new(forces: ForceConfig) -> Self {
        Self {
            bodies: Vec::new(),
            springs: Vec::new(),
            mouse: None,
            forces,
            force_hook: phases::apply_forces,
            acc: ForceBuffer::default(),
            last_contacts: 0,
        }
    }

    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = self.bodies.len();
        self.bodies.push(body);
        id
    }

    pub fn add_spring(&mut self, spring: Spring) -> SpringId {
        let id = self.springs.len();
        self.springs.push(spring);
        id
    }

    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id]
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn spring(&self, id: SpringId) -> &Spring {
        &self.springs[id]
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn mouse(&self) -> Option<&MouseSpring> {
        self.mouse.as_ref()
    }

    /// Contacts resolved during the last sub-step.
    pub fn last_contacts(&self) -> usize {
        self.last_contacts
    }

    /// Replaces the force callback run at the start of every sub-step.
    pub fn set_force_hook(&mut self, hook: ForceFn) {
        self.force_hook = hook;
    }

    /// Advances the simulation by `dt`, split into `sub_steps` equal parts.
    pub fn step(&mut self, dt: f32, sub_steps: usize) {
        let sub_steps = sub_steps.max(1);
        let sub_dt = dt / sub_steps as f32;

        for _ in 0..sub_steps {
            let before: Vec<Vec2> = self.bodies.iter().map(|b| b.pos).collect();

            self.acc.ensure_len(self.bodies.len());
            (self.force_hook)(&self.bodies, &self.forces, &mut self.acc);
            phases::spring_phase(&self.bodies, &self.springs, self.mouse.as_ref(), &mut self.acc);
            phases::integrate_phase(&mut self.bodies, &self.acc, sub_dt);
            self.last_contacts = phases::collision_phase(&mut self.bodies);

            for (id, (b, prev)) in self.bodies.iter_mut().zip(before).enumerate() {
                if !b.pos.is_finite() || !b.vel.is_finite() {
                    warn!("body {id} diverged; restoring last position");
                    b.pos = prev;
                    b.vel = Vec2::ZERO;
                }
            }
        }
    }

    /// Topmost tree-node body under `point`, if any.
    ///
    /// Twigs and leaves are not pickable.
    pub fn body_at(&self, point: Vec2) -> Option<BodyId> {
        self.bodies
            .iter()
            .enumerate()
            .rev()
            .find(|(_, b)| !b.kind.is_decor() && b.contains(point))
            .map(|(id, _)| id)
    }

    /// Attaches the pointer spring to `body`. Pinned bodies cannot be grabbed.
    pub fn grab(&mut self, body: BodyId, target: Vec2, stiffness: f32, damping: f32) -> bool {
        if self.bodies[body].pinned {
            return false;
        }
        self.mouse = Some(MouseSpring {
            body,
            target,
            stiffness,
            damping,
        });
        true
    }

    pub fn drag_to(&mut self, target: Vec2) {
        if let Some(m) = &mut self.mouse {
            m.target = target;
        }
    }

    pub fn release(&mut self) {
        self.mouse = None;
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.bodies.iter().map(Body::kinetic_energy).sum()
    }

    /// Axis-aligned bounds `(min, max)` of all bodies including radii.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        self.bodies.iter().fold(None, |acc, b| {
            let lo = b.pos - Vec2::splat(b.radius);
            let hi = b.pos + Vec2::splat(b.radius);
            Some(match acc {
                None => (lo, hi),
                Some((min, max)) => (min.min(lo), max.max(hi)),
            })
        })
    }
}
