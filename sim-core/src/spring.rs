//! Damped springs between bodies.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{body::Body, types::BodyId};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpringParams {
    pub length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpringKind {
    Branch,
    Twig,
    Leaf,
}

#[derive(Clone, Debug)]
pub struct Spring {
    pub a: BodyId,
    pub b: BodyId,
    pub length: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub kind: SpringKind,
}

/// Hooke force plus axial damping acting on the first of two bodies.
fn damped_force(
    pa: Vec2,
    va: Vec2,
    pb: Vec2,
    vb: Vec2,
    length: f32,
    stiffness: f32,
    damping: f32,
) -> Vec2 {
    let delta = pb - pa;
    let dist = delta.length();
    if dist <= f32::EPSILON {
        return Vec2::ZERO;
    }
    let axis = delta / dist;
    let stretch = dist - length;
    let closing = (vb - va).dot(axis);
    axis * (stiffness * stretch + damping * closing)
}

impl Spring {
    pub fn new(a: BodyId, b: BodyId, params: SpringParams, kind: SpringKind) -> Self {
        Self {
            a,
            b,
            length: params.length,
            stiffness: params.stiffness,
            damping: params.damping,
            kind,
        }
    }

    pub fn with_length(mut self, length: f32) -> Self {
        self.length = length;
        self
    }

    /// Force on body `a`; body `b` receives the negation.
    pub fn force_on_a(&self, bodies: &[Body]) -> Vec2 {
        let a = &bodies[self.a];
        let b = &bodies[self.b];
        damped_force(
            a.pos,
            a.vel,
            b.pos,
            b.vel,
            self.length,
            self.stiffness,
            self.damping,
        )
    }

    /// Current distance divided by rest length.
    pub fn strain(&self, bodies: &[Body]) -> f32 {
        let dist = (bodies[self.b].pos - bodies[self.a].pos).length();
        if self.length > 0.0 {
            dist / self.length
        } else {
            dist
        }
    }
}

/// Zero-length spring pulling a grabbed body toward the pointer.
#[derive(Clone, Copy, Debug)]
pub struct MouseSpring {
    pub body: BodyId,
    pub target: Vec2,
    pub stiffness: f32,
    pub damping: f32,
}

impl MouseSpring {
    pub fn force(&self, bodies: &[Body]) -> Vec2 {
        let b = &bodies[self.body];
        damped_force(
            b.pos,
            b.vel,
            self.target,
            Vec2::ZERO,
            0.0,
            self.stiffness,
            self.damping,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyKind;

    fn pair(dist: f32) -> Vec<Body> {
        vec![
            Body::new(Vec2::ZERO, 1.0, 1.0, BodyKind::Node),
            Body::new(Vec2::new(dist, 0.0), 1.0, 1.0, BodyKind::Node),
        ]
    }

    fn params(length: f32) -> SpringParams {
        SpringParams {
            length,
            stiffness: 2.0,
            damping: 0.5,
        }
    }

    #[test]
    fn rest_length_has_no_force() {
        let bodies = pair(5.0);
        let s = Spring::new(0, 1, params(5.0), SpringKind::Branch);
        assert!(s.force_on_a(&bodies).length() < 1e-6);
        assert!((s.strain(&bodies) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn stretched_spring_pulls_together() {
        let bodies = pair(8.0);
        let s = Spring::new(0, 1, params(5.0), SpringKind::Branch);
        let f = s.force_on_a(&bodies);
        // a is pulled toward b (+x) by stiffness * stretch.
        assert!((f.x - 6.0).abs() < 1e-5);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn with_length_overrides_rest_length() {
        let bodies = pair(8.0);
        let s = Spring::new(0, 1, params(5.0), SpringKind::Branch).with_length(8.0);
        assert_eq!(s.length, 8.0);
        assert_eq!(s.stiffness, 2.0);
        assert!(s.force_on_a(&bodies).length() < 1e-6);
    }

    #[test]
    fn compressed_spring_pushes_apart() {
        let bodies = pair(2.0);
        let s = Spring::new(0, 1, params(5.0), SpringKind::Leaf);
        assert!(s.force_on_a(&bodies).x < 0.0);
    }

    #[test]
    fn damping_opposes_separation_speed() {
        let mut bodies = pair(5.0);
        bodies[1].vel = Vec2::new(4.0, 0.0);
        let s = Spring::new(0, 1, params(5.0), SpringKind::Twig);
        // b moving away drags a along +x by damping * closing speed.
        assert!((s.force_on_a(&bodies).x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn coincident_bodies_produce_no_force() {
        let bodies = pair(0.0);
        let s = Spring::new(0, 1, params(5.0), SpringKind::Branch);
        assert_eq!(s.force_on_a(&bodies), Vec2::ZERO);
    }

    #[test]
    fn mouse_spring_pulls_toward_target() {
        let bodies = pair(1.0);
        let m = MouseSpring {
            body: 0,
            target: Vec2::new(0.0, 10.0),
            stiffness: 1.0,
            damping: 0.0,
        };
        let f = m.force(&bodies);
        assert!((f - Vec2::new(0.0, 10.0)).length() < 1e-5);
    }
}
