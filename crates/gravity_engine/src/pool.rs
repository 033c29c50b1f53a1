//! Fixed-capacity storage for all the live particles.
//!
//! Slots are reused through a free list rather than by shuffling the live particles around, so
//! a particle never moves in memory for as long as it's alive. Stepping happens in parallel but
//! removal is always a separate sequential pass, so no particle is ever removed while the
//! population is being iterated.

use rayon::prelude::*;

use crate::particle::Particle;

/// Why a particle left the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Removal {
    /// Crossed the event horizon.
    Absorbed,
    /// Went far beyond the edges of the viewport, or its maths blew up.
    Escaped,
}

/// The state of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Free to be reused.
    Vacant,
    /// Holds a particle that's taking part in the simulation.
    Live,
    /// Holds a particle that's been flagged for removal by the last step.
    Removed(Removal),
}

/// A particle and whether it's actually in use.
#[derive(Debug, Clone)]
struct Slot {
    /// The particle, meaningless when vacant.
    particle: Particle,
    /// The slot's state.
    state: SlotState,
}

/// Counts from a single step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct Reclaimed {
    /// How many crossed the horizon.
    pub absorbed: usize,
    /// How many escaped.
    pub escaped: usize,
}

/// All the particles.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    /// Every slot, whether in use or not. Never grows past `capacity`.
    slots: Vec<Slot>,
    /// Indices of vacant slots.
    free: Vec<usize>,
    /// The maximum number of live particles.
    capacity: usize,
    /// The ID given to the next spawned particle.
    next_id: u64,
    /// How many positions each particle's trail keeps.
    trail_length: usize,
}

impl ParticlePool {
    /// Make an empty pool.
    #[must_use]
    pub fn new(capacity: usize, trail_length: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            next_id: 0,
            trail_length,
        }
    }

    /// The maximum number of live particles.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many particles are alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether there are no live particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether another particle can be added.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Add a particle, with `init` setting its initial state. Returns `None`, without calling
    /// `init`, when the pool is full.
    ///
    /// `init` is given a particle with its ID set, zeroed kinematics and an empty trail.
    /// Vacant slots are reused, trail buffer and all, so spawning only allocates the first time
    /// a slot is used.
    pub fn spawn<F: FnOnce(&mut Particle)>(&mut self, init: F) -> Option<u64> {
        if self.is_full() {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    particle: Particle::new(
                        id,
                        glam::Vec2::ZERO,
                        glam::Vec2::ZERO,
                        self.trail_length,
                        crate::canvas::WHITE,
                    ),
                    state: SlotState::Vacant,
                });
                self.slots.len() - 1
            }
        };

        let slot = self.slots.get_mut(index)?;
        slot.particle.reset(id);
        slot.state = SlotState::Live;
        init(&mut slot.particle);

        Some(id)
    }

    /// Advance every live particle with `step`, in parallel. Any particle for which `step`
    /// returns a removal reason is reclaimed once all the stepping is done.
    pub fn step<F>(&mut self, step: F) -> Reclaimed
    where
        F: Fn(&mut Particle) -> Option<Removal> + Sync,
    {
        self.slots.par_iter_mut().for_each(|slot| {
            if slot.state == SlotState::Live {
                if let Some(removal) = step(&mut slot.particle) {
                    slot.state = SlotState::Removed(removal);
                }
            }
        });

        self.reclaim()
    }

    /// Move all the flagged slots onto the free list.
    fn reclaim(&mut self) -> Reclaimed {
        let mut reclaimed = Reclaimed::default();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let SlotState::Removed(removal) = slot.state {
                match removal {
                    Removal::Absorbed => reclaimed.absorbed += 1,
                    Removal::Escaped => reclaimed.escaped += 1,
                }
                slot.state = SlotState::Vacant;
                self.free.push(index);
            }
        }
        reclaimed
    }

    /// Reclaim every live particle that `predicate` selects, without stepping anything.
    pub fn remove_where<F>(&mut self, predicate: F) -> Reclaimed
    where
        F: Fn(&Particle) -> Option<Removal>,
    {
        for slot in &mut self.slots {
            if slot.state == SlotState::Live {
                if let Some(removal) = predicate(&slot.particle) {
                    slot.state = SlotState::Removed(removal);
                }
            }
        }

        self.reclaim()
    }

    /// Remove every particle, keeping the slots for reuse.
    pub fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.state = SlotState::Vacant;
            self.free.push(index);
        }
    }

    /// Live particles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> + Clone {
        self.slots
            .iter()
            .filter(|slot| slot.state == SlotState::Live)
            .map(|slot| &slot.particle)
    }

    /// Find a live particle by its ID.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Particle> {
        self.iter().find(|particle| particle.id == id)
    }
}

#[cfg(test)]
mod test {
    use glam::Vec2;

    use super::*;

    fn at(x: f32) -> impl FnOnce(&mut Particle) {
        move |particle| particle.position = Vec2::new(x, 0.0)
    }

    #[test]
    fn refuses_to_grow_past_capacity() {
        let mut pool = ParticlePool::new(2, 3);
        assert_eq!(pool.spawn(at(0.0)), Some(0));
        assert_eq!(pool.spawn(at(0.0)), Some(1));
        assert_eq!(pool.spawn(at(0.0)), None);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn removal_frees_a_slot_for_reuse() {
        let mut pool = ParticlePool::new(2, 3);
        pool.spawn(at(1.0));
        pool.spawn(at(-1.0));

        let reclaimed = pool.step(|particle| (particle.position.x < 0.0).then_some(Removal::Absorbed));
        assert_eq!(reclaimed.absorbed, 1);
        assert_eq!(pool.len(), 1);
        assert!(pool.get(1).is_none());

        assert_eq!(pool.spawn(at(5.0)), Some(2));
        assert_eq!(pool.len(), 2);
        assert!(pool.spawn(at(5.0)).is_none());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut pool = ParticlePool::new(1, 3);
        pool.spawn(at(0.0));
        pool.step(|_| Some(Removal::Escaped));
        pool.clear();
        assert_eq!(pool.spawn(at(0.0)), Some(1));
    }

    #[test]
    fn removed_particles_are_not_stepped_again() {
        let mut pool = ParticlePool::new(3, 3);
        pool.spawn(at(0.0));
        pool.step(|_| Some(Removal::Absorbed));
        let reclaimed = pool.step(|_| Some(Removal::Absorbed));
        assert_eq!(reclaimed, Reclaimed::default());
        assert!(pool.is_empty());
    }

    #[test]
    fn reused_slots_start_fresh() {
        let mut pool = ParticlePool::new(1, 3);
        pool.spawn(|particle| {
            particle.velocity = Vec2::ONE;
            particle.trail.push(Vec2::ONE);
        });
        pool.clear();
        pool.spawn(at(2.0));
        let particle = pool.iter().next().unwrap();
        assert_eq!(particle.id, 1);
        assert_eq!(particle.velocity, Vec2::ZERO);
        assert!(particle.trail.is_empty());
        assert_eq!(particle.trail.capacity(), 3);
    }

    #[test]
    fn removing_without_stepping() {
        let mut pool = ParticlePool::new(3, 3);
        pool.spawn(at(0.0));
        pool.spawn(at(5.0));
        let reclaimed = pool.remove_where(|particle| {
            (particle.position.x < 1.0).then_some(Removal::Absorbed)
        });
        assert_eq!(reclaimed.absorbed, 1);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.iter().map(|particle| particle.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(pool.get(1).map(|particle| particle.trail.len()), Some(0));
    }

    #[test]
    fn step_mutates_in_place() {
        let mut pool = ParticlePool::new(3, 3);
        pool.spawn(at(0.0));
        pool.step(|particle| {
            particle.position.x += 1.0;
            None
        });
        let position = pool.get(0).map(|particle| particle.position);
        assert_eq!(position, Some(Vec2::new(1.0, 0.0)));
    }
}
