//! Bringing new particles into the world.
//!
//! New particles appear just outside the viewport and, where possible, are given exactly the
//! speed they need to circle the attractor.

use glam::Vec2;
use palette::IntoColor as _;
use rand::Rng;

use crate::canvas::Colour;
use crate::config::Config;
use crate::gravity::{Environment, GravityModel};
use crate::pool::ParticlePool;

/// A random point on the rectangle that's `margin` outside the viewport.
pub fn edge_point<R: Rng + ?Sized>(rng: &mut R, viewport: Vec2, margin: f32) -> Vec2 {
    let along_x = rng.gen_range(0.0..=viewport.x.max(0.0));
    let along_y = rng.gen_range(0.0..=viewport.y.max(0.0));
    match rng.gen_range(0u8..4) {
        0 => Vec2::new(along_x, -margin),
        1 => Vec2::new(viewport.x + margin, along_y),
        2 => Vec2::new(along_x, viewport.y + margin),
        _ => Vec2::new(-margin, along_y),
    }
}

/// A pale blue-cyan colour for a particle's trail.
pub fn particle_colour<R: Rng + ?Sized>(rng: &mut R) -> Colour {
    let hue: f32 = rng.gen_range(180.0..=240.0);
    let hsl: palette::Hsl = palette::Hsl::new(hue, 1.0, 0.85);
    let rgb: palette::Srgb = hsl.into_color();
    (rgb.red, rgb.green, rgb.blue, 1.0)
}

/// The starting velocity for a particle at `position`.
///
/// Points comfortably outside the horizon get a tangential velocity for a circular orbit. Those
/// too close, where an orbit would be unstable or instantly absorbed, just get a small random
/// nudge.
pub fn initial_velocity<R: Rng + ?Sized>(
    rng: &mut R,
    position: Vec2,
    model: &dyn GravityModel,
    environment: &Environment,
    injection_margin: f32,
) -> Vec2 {
    let offset = environment.attractor.position - position;
    let distance = offset.length();
    let threshold = injection_margin * environment.attractor.schwarzschild_radius;

    if distance > threshold {
        if let Some(speed) = model.circular_orbit_speed(distance, environment) {
            return offset.normalize_or_zero().perp() * speed;
        }
    }

    tracing::trace!("Too close to inject an orbit at {distance}, using a random velocity");
    Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0))
}

/// Add a single particle at `position`. Silently does nothing when the pool is full.
pub fn spawn_particle<R: Rng + ?Sized>(
    pool: &mut ParticlePool,
    rng: &mut R,
    position: Vec2,
    model: &dyn GravityModel,
    environment: &Environment,
    config: &Config,
) -> Option<u64> {
    if pool.is_full() {
        return None;
    }

    let velocity = initial_velocity(rng, position, model, environment, config.injection_margin);
    let acceleration = model.acceleration(position, environment);
    let colour = particle_colour(rng);
    pool.spawn(|particle| {
        particle.position = position;
        particle.velocity = velocity;
        particle.acceleration = acceleration;
        particle.colour = colour;
    })
}

/// Add a burst of particles around the edges of the viewport. Returns how many were actually
/// added, which is fewer than the burst size when the pool fills up.
pub fn spawn_burst<R: Rng + ?Sized>(
    pool: &mut ParticlePool,
    rng: &mut R,
    viewport: Vec2,
    model: &dyn GravityModel,
    environment: &Environment,
    config: &Config,
) -> usize {
    let mut spawned = 0;
    for _ in 0..config.burst_size {
        let position = edge_point(rng, viewport, config.spawn_margin);
        if spawn_particle(pool, rng, position, model, environment, config).is_none() {
            break;
        }
        spawned += 1;
    }
    tracing::debug!("Spawned {spawned} particles, {} alive", pool.len());
    spawned
}

#[cfg(test)]
mod test {
    use rand::SeedableRng as _;

    use super::*;
    use crate::attractor::Attractor;
    use crate::gravity::PaczynskiWiita;
    use crate::params::Parameters;

    fn setup() -> (Config, Environment, rand::rngs::StdRng) {
        let config = Config::default();
        let attractor = Attractor::new(Vec2::new(400.0, 300.0), &Parameters::default(), &config);
        let environment = Environment::new(attractor, 1.0, &config);
        (config, environment, rand::rngs::StdRng::seed_from_u64(42))
    }

    #[test]
    fn edge_points_are_outside_the_viewport() {
        let (_, _, mut rng) = setup();
        let viewport = Vec2::new(800.0, 600.0);
        for _ in 0..100 {
            let point = edge_point(&mut rng, viewport, 50.0);
            let outside_x = (point.x + 50.0).abs() < 0.001 || (point.x - 850.0).abs() < 0.001;
            let outside_y = (point.y + 50.0).abs() < 0.001 || (point.y - 650.0).abs() < 0.001;
            assert!(outside_x || outside_y, "{point} is not on the spawn rectangle");
        }
    }

    #[test]
    fn colours_are_pale_cyan_to_blue() {
        let (_, _, mut rng) = setup();
        for _ in 0..50 {
            let (red, green, blue, alpha) = particle_colour(&mut rng);
            assert!(blue >= red);
            assert!(blue >= 0.99);
            assert!(green >= red);
            assert!((alpha - 1.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn injected_velocity_is_tangential() {
        let (config, environment, mut rng) = setup();
        let position = Vec2::new(400.0, 100.0);
        let velocity = initial_velocity(
            &mut rng,
            position,
            &PaczynskiWiita,
            &environment,
            config.injection_margin,
        );
        let radial = (environment.attractor.position - position).normalize();
        assert!(velocity.dot(radial).abs() < 0.0001);
        assert!(velocity.length() > 0.0);
    }

    #[test]
    fn too_close_for_an_orbit_gets_a_small_random_velocity() {
        let (config, environment, mut rng) = setup();
        let velocity = initial_velocity(
            &mut rng,
            Vec2::new(420.0, 300.0),
            &PaczynskiWiita,
            &environment,
            config.injection_margin,
        );
        assert!(velocity.x.abs() <= 1.0);
        assert!(velocity.y.abs() <= 1.0);
    }

    #[test]
    fn bursts_stop_at_the_cap() {
        let (mut config, environment, mut rng) = setup();
        config.max_particles = 20;
        let mut pool = ParticlePool::new(config.max_particles, config.trail_length);
        let viewport = Vec2::new(800.0, 600.0);

        let first = spawn_burst(&mut pool, &mut rng, viewport, &PaczynskiWiita, &environment, &config);
        let second = spawn_burst(&mut pool, &mut rng, viewport, &PaczynskiWiita, &environment, &config);
        assert_eq!(first, 12);
        assert_eq!(second, 8);
        assert_eq!(pool.len(), 20);
    }

    #[test]
    fn spawned_particles_carry_their_starting_acceleration() {
        let (config, environment, mut rng) = setup();
        let mut pool = ParticlePool::new(1, 5);
        let position = Vec2::new(400.0, 100.0);
        let id = spawn_particle(&mut pool, &mut rng, position, &PaczynskiWiita, &environment, &config)
            .unwrap();
        let particle = pool.get(id).unwrap();
        assert_eq!(
            particle.acceleration,
            PaczynskiWiita.acceleration(position, &environment)
        );
        assert!(particle.trail.is_empty());
    }
}
