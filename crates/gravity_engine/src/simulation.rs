//! The simulation controller.
//!
//! A [`Simulation`] exclusively owns all the particles and parameters. Nothing else mutates
//! them. Input from elsewhere arrives as [`Command`]s which are queued and only applied at the
//! very start of the next tick, so every particle within a frame sees exactly the same attractor
//! and parameters.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng as _;

use crate::attractor::Attractor;
use crate::canvas::Canvas;
use crate::config::Config;
use crate::errors::Result;
use crate::gravity::{Environment, StepOutcome};
use crate::params::{ParameterUpdate, Parameters};
use crate::particle::Particle;
use crate::pool::{ParticlePool, Reclaimed, Removal};
use crate::renderer::{self, Scene};
use crate::spawn;

/// The most commands that can be waiting for the next tick.
const MAX_PENDING_COMMANDS: usize = 256;

/// Requests to change the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum Command {
    /// Put the attractor somewhere else, in world units.
    MoveAttractor(Vec2),
    /// Move the attractor by an offset, in world units.
    NudgeAttractor(Vec2),
    /// Add a burst of particles around the edges of the viewport.
    SpawnBurst,
    /// Change one of the live parameters.
    Parameter(ParameterUpdate),
    /// Pause if running, run if paused.
    TogglePause,
    /// Explicitly pause or run.
    SetPaused(bool),
    /// Remove every particle.
    Clear,
}

/// The whole state of the world.
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Physics and rendering tunables.
    config: Config,
    /// The live parameters.
    parameters: Parameters,
    /// Where the attractor is, in world units.
    attractor_position: Vec2,
    /// Size of the visible world, in world units.
    viewport: Vec2,
    /// Every live particle.
    pool: ParticlePool,
    /// Commands waiting for the next tick.
    pending: VecDeque<Command>,
    /// Source of all randomness.
    rng: rand::rngs::StdRng,
    /// Whether integration is suspended.
    is_paused: bool,
    /// How many ticks have integrated particles.
    frame: u64,
}

impl Simulation {
    /// Make an empty simulation with the attractor in the middle of the viewport.
    ///
    /// # Errors
    /// When the config has values that can't be simulated.
    pub fn new(config: Config, parameters: Parameters, viewport: Vec2) -> Result<Self> {
        Self::with_rng(config, parameters, viewport, rand::rngs::StdRng::from_entropy())
    }

    /// Like [`Simulation::new`] but reproducible.
    ///
    /// # Errors
    /// When the config has values that can't be simulated.
    pub fn with_seed(
        config: Config,
        parameters: Parameters,
        viewport: Vec2,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(
            config,
            parameters,
            viewport,
            rand::rngs::StdRng::seed_from_u64(seed),
        )
    }

    /// Shared constructor.
    fn with_rng(
        config: Config,
        parameters: Parameters,
        viewport: Vec2,
        rng: rand::rngs::StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let viewport = viewport.max(Vec2::ZERO);
        tracing::debug!("New simulation with viewport {viewport}");

        Ok(Self {
            pool: ParticlePool::new(config.max_particles, config.trail_length),
            config,
            parameters: parameters.clamped(),
            attractor_position: viewport / 2.0,
            viewport,
            pending: VecDeque::new(),
            rng,
            is_paused: false,
            frame: 0,
        })
    }

    /// Queue a command for the start of the next tick.
    ///
    /// Consecutive moves of the attractor are merged. Returns `false` if the queue is full and
    /// the command was dropped.
    pub fn queue(&mut self, command: Command) -> bool {
        if let Command::MoveAttractor(position) = command {
            if let Some(Command::MoveAttractor(last)) = self.pending.back_mut() {
                *last = position;
                return true;
            }
        }

        if self.pending.len() >= MAX_PENDING_COMMANDS {
            tracing::warn!("Command queue full, dropping {command:?}");
            return false;
        }
        self.pending.push_back(command);
        true
    }

    /// Apply a command immediately.
    pub fn apply(&mut self, command: Command) {
        tracing::trace!("Applying {command:?}");
        match command {
            Command::MoveAttractor(position) => self.move_attractor(position),
            Command::NudgeAttractor(offset) => {
                self.move_attractor(self.attractor_position + offset);
            }
            Command::SpawnBurst => {
                self.spawn_burst();
            }
            Command::Parameter(update) => self.parameters.apply(update),
            Command::TogglePause => self.is_paused = !self.is_paused,
            Command::SetPaused(is_paused) => self.is_paused = is_paused,
            Command::Clear => self.clear(),
        }
    }

    /// Put the attractor somewhere within the viewport.
    fn move_attractor(&mut self, position: Vec2) {
        if !position.is_finite() {
            return;
        }
        self.attractor_position = position.clamp(Vec2::ZERO, self.viewport);
    }

    /// Advance the world by one frame.
    ///
    /// Queued commands are applied first and anything left inside the horizon is removed. Then,
    /// unless paused or with time stopped, every particle is integrated and those that were
    /// absorbed or escaped are removed.
    pub fn tick(&mut self) -> Reclaimed {
        while let Some(command) = self.pending.pop_front() {
            self.apply(command);
        }

        // The attractor or its mass may have changed since the last tick, even with time
        // stopped, so anything now inside the horizon goes before it can be drawn.
        let attractor = self.attractor();
        let mut reclaimed = self.pool.remove_where(|particle| {
            attractor
                .is_inside_horizon(particle.position)
                .then_some(Removal::Absorbed)
        });

        let dt = self.parameters.time_scale;
        if self.is_paused || dt <= 0.0 {
            return reclaimed;
        }

        let environment = self.environment();
        let model = self.parameters.model.model();
        let margin = self.config.escape_margin;
        let (min, max) = (Vec2::splat(-margin), self.viewport + margin);

        let stepped = self.pool.step(|particle| {
            match model.step(particle, &environment) {
                StepOutcome::Moved => {
                    let is_inside = particle.position.cmpge(min).all()
                        && particle.position.cmple(max).all();
                    (!is_inside).then_some(Removal::Escaped)
                }
                StepOutcome::Absorbed => Some(Removal::Absorbed),
                StepOutcome::Escaped => Some(Removal::Escaped),
            }
        });
        reclaimed.absorbed += stepped.absorbed;
        reclaimed.escaped += stepped.escaped;

        self.frame += 1;
        if reclaimed.absorbed > 0 || reclaimed.escaped > 0 {
            tracing::trace!(
                "Frame {}: {} absorbed, {} escaped, {} alive",
                self.frame,
                reclaimed.absorbed,
                reclaimed.escaped,
                self.pool.len()
            );
        }
        reclaimed
    }

    /// Draw the current state of the world.
    ///
    /// # Errors
    /// When the canvas has no pixels, in which case the frame should just be skipped.
    pub fn render(&self, canvas: &mut Canvas, scale: f32) -> Result<()> {
        let attractor = self.attractor();
        let scene = Scene {
            config: &self.config,
            attractor: &attractor,
            viewport: self.viewport,
            grid_spacing: self.parameters.grid_spacing,
            particles: self.pool.iter(),
            scale,
        };
        renderer::draw(canvas, &scene)
    }

    /// The visible world changed size. The attractor is kept within it.
    pub fn resize(&mut self, viewport: Vec2) {
        if !viewport.is_finite() {
            return;
        }
        self.viewport = viewport.max(Vec2::ZERO);
        self.attractor_position = self.attractor_position.clamp(Vec2::ZERO, self.viewport);
        tracing::debug!("Simulation resized to {}", self.viewport);
    }

    /// Add a burst of particles from the edges. Returns how many were added.
    pub fn spawn_burst(&mut self) -> usize {
        let environment = self.environment();
        spawn::spawn_burst(
            &mut self.pool,
            &mut self.rng,
            self.viewport,
            self.parameters.model.model(),
            &environment,
            &self.config,
        )
    }

    /// Add a single particle, aimed for a circular orbit where possible.
    pub fn spawn_particle_at(&mut self, position: Vec2) -> Option<u64> {
        let environment = self.environment();
        spawn::spawn_particle(
            &mut self.pool,
            &mut self.rng,
            position,
            self.parameters.model.model(),
            &environment,
            &self.config,
        )
    }

    /// Add a single particle with a starting velocity, capped to the speed limit.
    pub fn insert_particle(&mut self, position: Vec2, velocity: Vec2) -> Option<u64> {
        let velocity = crate::gravity::cap_speed(velocity, self.config.max_speed());
        let environment = self.environment();
        let acceleration = self
            .parameters
            .model
            .model()
            .acceleration(position, &environment);
        let colour = spawn::particle_colour(&mut self.rng);
        self.pool.spawn(|particle| {
            particle.position = position;
            particle.velocity = velocity;
            particle.acceleration = acceleration;
            particle.colour = colour;
        })
    }

    /// Remove every particle.
    pub fn clear(&mut self) {
        tracing::debug!("Clearing {} particles", self.pool.len());
        self.pool.clear();
    }

    /// The attractor as it is right now.
    #[must_use]
    pub fn attractor(&self) -> Attractor {
        Attractor::new(self.attractor_position, &self.parameters, &self.config)
    }

    /// The snapshot that a tick would integrate with right now.
    #[must_use]
    pub fn environment(&self) -> Environment {
        Environment::new(self.attractor(), self.parameters.time_scale, &self.config)
    }

    /// The live parameters.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Physics and rendering tunables.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Size of the visible world.
    #[must_use]
    pub const fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// All the live particles.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter()
    }

    /// Find a particle by its ID.
    #[must_use]
    pub fn particle(&self, id: u64) -> Option<&Particle> {
        self.pool.get(id)
    }

    /// How many particles are alive.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.pool.len()
    }

    /// Whether integration is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// How many ticks have integrated particles.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }
}
