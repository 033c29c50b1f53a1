//! A fixed-capacity history of positions.

use glam::Vec2;

/// Ring buffer of a particle's most recent positions.
///
/// Pushing onto a full trail drops the oldest point, so a trail never allocates after it's
/// created.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    /// Storage, only the first `len` entries starting from `start` (wrapping) are meaningful.
    points: Vec<Vec2>,
    /// Index of the oldest point.
    start: usize,
    /// How many points are stored.
    len: usize,
}

impl Trail {
    /// Make an empty trail. A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: vec![Vec2::ZERO; capacity.max(1)],
            start: 0,
            len: 0,
        }
    }

    /// The most points this trail will ever hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// How many points are currently stored.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record a new position, evicting the oldest one if full.
    pub fn push(&mut self, point: Vec2) {
        let capacity = self.capacity();
        if self.len < capacity {
            let index = (self.start + self.len) % capacity;
            if let Some(slot) = self.points.get_mut(index) {
                *slot = point;
            }
            self.len += 1;
        } else {
            if let Some(slot) = self.points.get_mut(self.start) {
                *slot = point;
            }
            self.start = (self.start + 1) % capacity;
        }
    }

    /// Forget all points, keeping the allocation.
    pub fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }

    /// The most recently pushed point.
    #[must_use]
    pub fn newest(&self) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }
        let index = (self.start + self.len - 1) % self.capacity();
        self.points.get(index).copied()
    }

    /// Points from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        let (wrapped, oldest) = self.points.split_at(self.start);
        oldest.iter().chain(wrapped).take(self.len).copied()
    }
}

#[cfg(test)]
#[expect(clippy::as_conversions, clippy::cast_precision_loss, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut trail = Trail::with_capacity(3);
        trail.push(Vec2::new(1.0, 0.0));
        trail.push(Vec2::new(2.0, 0.0));
        let xs: Vec<f32> = trail.iter().map(|point| point.x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
        assert_eq!(trail.newest(), Some(Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut trail = Trail::with_capacity(3);
        for x in 0..5 {
            trail.push(Vec2::new(x as f32, 0.0));
        }
        assert_eq!(trail.len(), 3);
        let xs: Vec<f32> = trail.iter().map(|point| point.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert_eq!(trail.newest(), Some(Vec2::new(4.0, 0.0)));
    }

    #[test]
    fn clearing() {
        let mut trail = Trail::with_capacity(2);
        trail.push(Vec2::ONE);
        trail.clear();
        assert!(trail.is_empty());
        assert_eq!(trail.newest(), None);
        assert_eq!(trail.iter().count(), 0);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut trail = Trail::with_capacity(0);
        trail.push(Vec2::ONE);
        trail.push(Vec2::ZERO);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.newest(), Some(Vec2::ZERO));
    }
}
