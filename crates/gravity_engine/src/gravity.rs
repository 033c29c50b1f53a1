//! The laws of gravity that particles can be integrated with.
//!
//! Both models only ever consider the single central attractor, particles don't attract each
//! other.

use glam::Vec2;

use crate::attractor::Attractor;
use crate::config::Config;
use crate::params::ModelKind;
use crate::particle::Particle;

/// A snapshot of everything a model needs for one frame. Every particle in a frame sees the
/// exact same snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Environment {
    /// The central mass.
    pub attractor: Attractor,
    /// The time step, in frames.
    pub dt: f32,
    /// The maximum magnitude of acceleration.
    pub force_clamp: f32,
    /// The floor for the distance from the horizon.
    pub horizon_epsilon: f32,
    /// The speed limit.
    pub max_speed: f32,
    /// Softening for the Newtonian model.
    pub softening: f32,
}

impl Environment {
    /// Build a snapshot for a frame.
    #[must_use]
    pub fn new(attractor: Attractor, dt: f32, config: &Config) -> Self {
        Self {
            attractor,
            dt,
            force_clamp: config.force_clamp,
            horizon_epsilon: config.horizon_epsilon,
            max_speed: config.max_speed(),
            softening: config.newtonian_softening,
        }
    }

    /// Whether moving in a straight line from `from` to `to` passes within the horizon.
    ///
    /// Just checking the end point lets fast particles tunnel straight through the attractor
    /// when the time step is large.
    #[must_use]
    pub fn crosses_horizon(&self, from: Vec2, to: Vec2) -> bool {
        let centre = self.attractor.position;
        let segment = to - from;
        let length_squared = segment.length_squared();
        let closest = if length_squared > 0.0 && length_squared.is_finite() {
            let along = ((centre - from).dot(segment) / length_squared).clamp(0.0, 1.0);
            from + segment * along
        } else {
            to
        };
        closest.distance(centre) < self.attractor.schwarzschild_radius
    }
}

/// What happened to a particle in a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepOutcome {
    /// Still taking part.
    Moved,
    /// Crossed the horizon. Its state has not been updated.
    Absorbed,
    /// Its maths produced something non-finite, so it can't be simulated any more.
    Escaped,
}

/// A law of gravity and a way of integrating it.
pub trait GravityModel: Send + Sync {
    /// Human readable name.
    fn name(&self) -> &'static str;

    /// The acceleration felt at a point.
    fn acceleration(&self, position: Vec2, environment: &Environment) -> Vec2;

    /// Advance a particle by one time step, appending its new position to its trail.
    fn step(&self, particle: &mut Particle, environment: &Environment) -> StepOutcome;

    /// The speed needed for a circular orbit at the given distance, capped to the speed limit.
    /// `None` when there's no such orbit.
    fn circular_orbit_speed(&self, distance: f32, environment: &Environment) -> Option<f32>;
}

/// Rescale a velocity so it's no faster than `max_speed`, keeping its direction.
#[must_use]
pub fn cap_speed(velocity: Vec2, max_speed: f32) -> Vec2 {
    let speed = velocity.length();
    if speed > max_speed {
        velocity * (max_speed / speed)
    } else {
        velocity
    }
}

/// Gravity with a force of `GM / (r - Rs)²`, integrated with Velocity Verlet.
///
/// This mimics strong-field gravity closely enough to have an innermost stable orbit and a
/// photon sphere, without any actual general relativity.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct PaczynskiWiita;

impl GravityModel for PaczynskiWiita {
    fn name(&self) -> &'static str {
        ModelKind::PaczynskiWiita.name()
    }

    fn acceleration(&self, position: Vec2, environment: &Environment) -> Vec2 {
        let offset = environment.attractor.position - position;
        let distance = offset.length();
        let from_horizon = (distance - environment.attractor.schwarzschild_radius)
            .max(environment.horizon_epsilon);
        let force = (environment.attractor.gm / from_horizon.powi(2)).min(environment.force_clamp);
        offset.normalize_or_zero() * force
    }

    fn step(&self, particle: &mut Particle, environment: &Environment) -> StepOutcome {
        let dt = environment.dt;
        let next_position =
            particle.position + particle.velocity * dt + 0.5 * particle.acceleration * dt * dt;

        if !next_position.is_finite() {
            return StepOutcome::Escaped;
        }
        if environment.crosses_horizon(particle.position, next_position) {
            return StepOutcome::Absorbed;
        }

        let next_acceleration = self.acceleration(next_position, environment);
        let next_velocity = cap_speed(
            particle.velocity + 0.5 * (particle.acceleration + next_acceleration) * dt,
            environment.max_speed,
        );

        particle.position = next_position;
        particle.velocity = next_velocity;
        particle.acceleration = next_acceleration;
        particle.trail.push(next_position);

        if particle.is_finite() {
            StepOutcome::Moved
        } else {
            StepOutcome::Escaped
        }
    }

    fn circular_orbit_speed(&self, distance: f32, environment: &Environment) -> Option<f32> {
        let from_horizon = distance - environment.attractor.schwarzschild_radius;
        if from_horizon <= 0.0 {
            return None;
        }
        let speed = (environment.attractor.gm * distance).sqrt() / from_horizon;
        speed.is_finite().then(|| speed.min(environment.max_speed))
    }
}

/// Softened inverse-square gravity, integrated with semi-implicit Euler.
#[derive(Debug, Default, Clone, Copy)]
#[non_exhaustive]
pub struct Newtonian;

impl GravityModel for Newtonian {
    fn name(&self) -> &'static str {
        ModelKind::Newtonian.name()
    }

    fn acceleration(&self, position: Vec2, environment: &Environment) -> Vec2 {
        let offset = environment.attractor.position - position;
        let force = (environment.attractor.gm / (offset.length_squared() + environment.softening))
            .min(environment.force_clamp);
        offset.normalize_or_zero() * force
    }

    fn step(&self, particle: &mut Particle, environment: &Environment) -> StepOutcome {
        if environment.attractor.is_inside_horizon(particle.position) {
            return StepOutcome::Absorbed;
        }

        let dt = environment.dt;
        let acceleration = self.acceleration(particle.position, environment);
        let velocity = cap_speed(particle.velocity + acceleration * dt, environment.max_speed);
        let next_position = particle.position + velocity * dt;

        if !next_position.is_finite() {
            return StepOutcome::Escaped;
        }
        if environment.crosses_horizon(particle.position, next_position) {
            return StepOutcome::Absorbed;
        }

        particle.position = next_position;
        particle.velocity = velocity;
        particle.acceleration = acceleration;
        particle.trail.push(next_position);

        StepOutcome::Moved
    }

    fn circular_orbit_speed(&self, distance: f32, environment: &Environment) -> Option<f32> {
        if distance <= 0.0 {
            return None;
        }
        let speed = (environment.attractor.gm * distance
            / (distance.powi(2) + environment.softening))
            .sqrt();
        speed.is_finite().then(|| speed.min(environment.max_speed))
    }
}

/// The single shared instance of the Paczyński–Wiita model.
static PACZYNSKI_WIITA: PaczynskiWiita = PaczynskiWiita;
/// The single shared instance of the Newtonian model.
static NEWTONIAN: Newtonian = Newtonian;

impl ModelKind {
    /// The implementation of this model.
    #[must_use]
    pub fn model(self) -> &'static dyn GravityModel {
        match self {
            Self::PaczynskiWiita => &PACZYNSKI_WIITA,
            Self::Newtonian => &NEWTONIAN,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::Parameters;

    fn environment(dt: f32) -> Environment {
        let config = Config::default();
        let attractor = Attractor::new(Vec2::ZERO, &Parameters::default(), &config);
        Environment::new(attractor, dt, &config)
    }

    fn particle_at(position: Vec2, velocity: Vec2) -> Particle {
        Particle::new(0, position, velocity, 25, crate::canvas::WHITE)
    }

    #[test]
    fn acceleration_points_at_the_attractor() {
        let acceleration = PaczynskiWiita.acceleration(Vec2::new(100.0, 0.0), &environment(1.0));
        assert!(acceleration.x < 0.0);
        assert!(acceleration.y.abs() < f32::EPSILON);
        // 3200 / (100 - 16)²
        assert!((acceleration.length() - 0.4535).abs() < 0.001);
    }

    #[test]
    fn acceleration_is_clamped_near_the_horizon() {
        let environment = environment(1.0);
        let acceleration = PaczynskiWiita.acceleration(Vec2::new(16.5, 0.0), &environment);
        assert!((acceleration.length() - environment.force_clamp).abs() < 0.001);
    }

    #[test]
    fn acceleration_at_the_centre_is_zero() {
        let acceleration = PaczynskiWiita.acceleration(Vec2::ZERO, &environment(1.0));
        assert_eq!(acceleration, Vec2::ZERO);
    }

    #[test]
    fn cap_speed_keeps_direction() {
        let capped = cap_speed(Vec2::new(30.0, 40.0), 10.0);
        assert!((capped.length() - 10.0).abs() < 0.001);
        assert!((capped.x / capped.y - 0.75).abs() < 0.001);
        assert_eq!(cap_speed(Vec2::ONE, 10.0), Vec2::ONE);
    }

    #[test]
    fn verlet_step_appends_to_trail() {
        let environment = environment(1.0);
        let mut particle = particle_at(Vec2::new(200.0, 0.0), Vec2::new(0.0, 3.0));
        particle.acceleration = PaczynskiWiita.acceleration(particle.position, &environment);

        let outcome = PaczynskiWiita.step(&mut particle, &environment);
        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(particle.trail.newest(), Some(particle.position));
        assert!(particle.position.y > 0.0);
        assert!(particle.position.x < 200.0);
    }

    #[test]
    fn tunnelling_through_the_attractor_is_absorption() {
        let environment = environment(1.0);
        let mut particle = particle_at(Vec2::new(-17.5, 0.0), Vec2::new(35.0, 0.0));
        let outcome = PaczynskiWiita.step(&mut particle, &environment);
        assert_eq!(outcome, StepOutcome::Absorbed);
    }

    #[test]
    fn absorbed_particles_are_left_untouched() {
        let environment = environment(1.0);
        let mut particle = particle_at(Vec2::new(20.0, 0.0), Vec2::new(-10.0, 0.0));
        let before = particle.clone();
        assert_eq!(PaczynskiWiita.step(&mut particle, &environment), StepOutcome::Absorbed);
        assert_eq!(particle, before);
    }

    #[test]
    fn circular_orbit_speed_balances_centripetal_force() {
        let environment = environment(1.0);
        let speed = PaczynskiWiita
            .circular_orbit_speed(200.0, &environment)
            .unwrap();
        let acceleration = PaczynskiWiita.acceleration(Vec2::new(200.0, 0.0), &environment);
        assert!((speed.powi(2) / 200.0 - acceleration.length()).abs() < 0.0001);
    }

    #[test]
    fn no_orbit_inside_the_horizon() {
        assert!(PaczynskiWiita
            .circular_orbit_speed(10.0, &environment(1.0))
            .is_none());
    }

    #[test]
    fn newtonian_orbit_speed() {
        let environment = environment(1.0);
        let speed = Newtonian.circular_orbit_speed(200.0, &environment).unwrap();
        let acceleration = Newtonian.acceleration(Vec2::new(200.0, 0.0), &environment);
        assert!((speed.powi(2) / 200.0 - acceleration.length()).abs() < 0.0001);
    }

    #[test]
    fn newtonian_step_is_semi_implicit() {
        let environment = environment(2.0);
        let mut particle = particle_at(Vec2::new(300.0, 0.0), Vec2::ZERO);
        let acceleration = Newtonian.acceleration(particle.position, &environment);

        assert_eq!(Newtonian.step(&mut particle, &environment), StepOutcome::Moved);
        assert!((particle.velocity - acceleration * 2.0).length() < 0.0001);
        assert!((particle.position - (Vec2::new(300.0, 0.0) + particle.velocity * 2.0)).length() < 0.0001);
    }

    #[test]
    fn models_by_kind() {
        assert_eq!(ModelKind::Newtonian.model().name(), "Newtonian");
        assert_eq!(ModelKind::PaczynskiWiita.model().name(), "Paczyński–Wiita");
    }
}
