use crate::types::BodyId;
use glam::Vec2;

/// A per-tick buffer that accumulates the net force acting on each body.
///
/// Force phases add into this buffer, and the integration phase reads the
/// total back. Internally, `force[i]` corresponds to body `i` of the
/// [`crate::world::World`] the buffer is used with.
#[derive(Debug, Default)]
pub struct ForceBuffer {
    force: Vec<Vec2>,
}

impl ForceBuffer {
    /// Creates a new [`ForceBuffer`] with every entry set to `Vec2::ZERO`.
    ///
    /// ### Parameters
    /// - `len` - Number of bodies this buffer can store forces for.
    pub fn with_len(len: usize) -> Self {
        Self {
            force: vec![Vec2::ZERO; len],
        }
    }

    /// Resizes the buffer to `len` entries and clears it.
    ///
    /// After this call every entry is `Vec2::ZERO`, even if the length was
    /// already correct.
    pub fn ensure_len(&mut self, len: usize) {
        if self.force.len() != len {
            self.force.resize(len, Vec2::ZERO);
        }
        self.clear();
    }

    /// Resets all accumulated forces without changing the length.
    pub fn clear(&mut self) {
        for f in &mut self.force {
            *f = Vec2::ZERO;
        }
    }

    /// Adds `f` to the force acting on body `id`.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn add(&mut self, id: BodyId, f: Vec2) {
        self.force[id] += f;
    }

    /// Returns the accumulated force on body `id`.
    #[inline]
    pub fn get(&self, id: BodyId) -> Vec2 {
        self.force[id]
    }

    pub fn len(&self) -> usize {
        self.force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.force.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.force.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_initializes_zeroed_state() {
        let buf = ForceBuffer::with_len(5);
        assert_eq!(buf.len(), 5);
        assert!(buf.iter().all(|f| f == Vec2::ZERO));
    }

    #[test]
    fn ensure_len_keeps_length_and_clears_when_same() {
        let mut buf = ForceBuffer::with_len(3);
        buf.add(1, Vec2::new(1.0, 2.0));
        assert_eq!(buf.get(1), Vec2::new(1.0, 2.0));

        buf.ensure_len(3);

        assert_eq!(buf.len(), 3);
        assert!(buf.iter().all(|f| f == Vec2::ZERO));
    }

    #[test]
    fn ensure_len_grows_and_clears() {
        let mut buf = ForceBuffer::with_len(1);
        buf.add(0, Vec2::ONE);
        buf.ensure_len(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.get(0), Vec2::ZERO);
    }

    #[test]
    fn add_accumulates() {
        let mut buf = ForceBuffer::with_len(2);
        buf.add(0, Vec2::new(1.0, 0.0));
        buf.add(0, Vec2::new(0.5, -1.0));
        assert_eq!(buf.get(0), Vec2::new(1.5, -1.0));
        assert_eq!(buf.get(1), Vec2::ZERO);
    }
}
