//! Circular point-mass bodies and collision filtering.

use glam::Vec2;

/// What a body represents in the drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Node,
    Twig,
    Leaf,
}

impl BodyKind {
    pub fn is_decor(self) -> bool {
        !matches!(self, BodyKind::Node)
    }
}

/// Collision filter with group / category / mask semantics.
///
/// Two bodies that share a non-zero `group` collide iff the group is
/// positive. Otherwise they collide iff each category intersects the other
/// body's mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    pub group: i32,
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const NODE_CATEGORY: u32 = 0x0001;
    pub const DECOR_CATEGORY: u32 = 0x0002;

    /// Tree nodes collide with each other only.
    pub const NODE: Self = Self {
        group: 0,
        category: Self::NODE_CATEGORY,
        mask: Self::NODE_CATEGORY,
    };

    /// Twigs and leaves never collide.
    pub const DECOR: Self = Self {
        group: -1,
        category: Self::DECOR_CATEGORY,
        mask: 0,
    };

    pub fn can_collide(a: &Self, b: &Self) -> bool {
        if a.group == b.group && a.group != 0 {
            return a.group > 0;
        }
        (a.mask & b.category) != 0 && (b.mask & a.category) != 0
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub inv_mass: f32,
    pub kind: BodyKind,
    pub filter: CollisionFilter,
    pub pinned: bool,
}

impl Body {
    /// Creates a dynamic body whose mass is `density * area`.
    pub fn new(pos: Vec2, radius: f32, density: f32, kind: BodyKind) -> Self {
        let mass = density * std::f32::consts::PI * radius * radius;
        let inv_mass = if mass > 1e-10 { 1.0 / mass } else { 0.0 };
        let filter = if kind.is_decor() {
            CollisionFilter::DECOR
        } else {
            CollisionFilter::NODE
        };
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            mass,
            inv_mass,
            kind,
            filter,
            pinned: false,
        }
    }

    /// Creates a static body that is never integrated.
    pub fn pinned(pos: Vec2, radius: f32, kind: BodyKind) -> Self {
        let mut body = Self::new(pos, radius, 1.0, kind);
        body.pin();
        body
    }

    pub fn pin(&mut self) {
        self.pinned = true;
        self.inv_mass = 0.0;
        self.vel = Vec2::ZERO;
    }

    /// Semi-implicit Euler step with the accumulated `force`.
    pub fn integrate(&mut self, dt: f32, force: Vec2) {
        if self.pinned {
            return;
        }
        self.vel += force * self.inv_mass * dt;
        self.pos += self.vel * dt;
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (point - self.pos).length_squared() <= self.radius * self.radius
    }

    pub fn kinetic_energy(&self) -> f32 {
        if self.pinned {
            0.0
        } else {
            0.5 * self.mass * self.vel.length_squared()
        }
    }
}
