//! A single test particle.

use glam::Vec2;

use crate::canvas::Colour;
use crate::trail::Trail;

/// A massless particle that only feels the attractor.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Particle {
    /// Unique for the lifetime of a simulation, never reused.
    pub id: u64,
    /// Position in world units.
    pub position: Vec2,
    /// Velocity in world units per frame.
    pub velocity: Vec2,
    /// The acceleration from the end of the previous step, needed by Velocity Verlet.
    pub acceleration: Vec2,
    /// Recent positions, oldest first.
    pub trail: Trail,
    /// What colour to draw the trail.
    pub colour: Colour,
}

impl Particle {
    /// Make a particle with an empty trail.
    #[must_use]
    pub fn new(
        id: u64,
        position: Vec2,
        velocity: Vec2,
        trail_length: usize,
        colour: Colour,
    ) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vec2::ZERO,
            trail: Trail::with_capacity(trail_length),
            colour,
        }
    }

    /// Make this particle brand new again, keeping its trail's allocation.
    pub fn reset(&mut self, id: u64) {
        self.id = id;
        self.position = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.trail.clear();
        self.colour = crate::canvas::WHITE;
    }

    /// Current speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Whether the particle's state has been corrupted by an arithmetic blow-up.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.acceleration.is_finite()
    }
}
