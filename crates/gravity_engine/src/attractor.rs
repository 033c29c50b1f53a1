//! The single massive object at the centre of it all.

use glam::Vec2;

use crate::config::Config;
use crate::params::Parameters;

/// The black hole and all the radii derived from its mass.
///
/// This is rebuilt whenever the parameters change, which is cheap, so that nothing downstream
/// ever sees a stale horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Attractor {
    /// Where it is in world units.
    pub position: Vec2,
    /// The mass, `M`.
    pub mass: f32,
    /// `G * M`, in world units.
    pub gm: f32,
    /// The Schwarzschild radius, `Rs = 2GM / c²`.
    pub schwarzschild_radius: f32,
    /// Where light orbits, drawn as a thin ring.
    pub photon_sphere_radius: f32,
    /// The inner edge of the glow.
    pub accretion_inner_radius: f32,
    /// The outer edge of the glow.
    pub accretion_outer_radius: f32,
    /// Beyond this the reference grid isn't distorted at all.
    pub lensing_reach: f32,
}

impl Attractor {
    /// Derive everything from the current parameters.
    #[must_use]
    pub fn new(position: Vec2, parameters: &Parameters, config: &Config) -> Self {
        let gm = parameters.gm(config.g_scale);
        let schwarzschild_radius = 2.0 * gm / config.speed_of_light.powi(2);
        let lensing_reach = (config.lensing_reach * parameters.mass.sqrt())
            .max(config.min_reach_factor * schwarzschild_radius);

        Self {
            position,
            mass: parameters.mass,
            gm,
            schwarzschild_radius,
            photon_sphere_radius: config.photon_sphere_factor * schwarzschild_radius,
            accretion_inner_radius: config.accretion_inner_factor * schwarzschild_radius,
            accretion_outer_radius: config.accretion_outer_factor * schwarzschild_radius,
            lensing_reach,
        }
    }

    /// Distance from the centre.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Whether a point has crossed the event horizon.
    #[must_use]
    pub fn is_inside_horizon(&self, point: Vec2) -> bool {
        self.distance_to(point) < self.schwarzschild_radius
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_radii() {
        let attractor = Attractor::new(Vec2::ZERO, &Parameters::default(), &Config::default());
        assert!((attractor.schwarzschild_radius - 16.0).abs() < 0.001);
        assert!((attractor.photon_sphere_radius - 24.0).abs() < 0.001);
        assert!((attractor.accretion_outer_radius - 80.0).abs() < 0.001);
        assert!((attractor.lensing_reach - 240.0).abs() < 0.001);
    }

    #[test]
    fn reach_never_smaller_than_three_horizons() {
        let parameters = Parameters {
            mass: 20.0,
            gravitational_constant: 3.0,
            ..Parameters::default()
        };
        let attractor = Attractor::new(Vec2::ZERO, &parameters, &Config::default());
        assert!((attractor.schwarzschild_radius - 300.0).abs() < 0.01);
        assert!((attractor.lensing_reach - 900.0).abs() < 0.01);
    }

    #[test]
    fn horizon_membership() {
        let attractor =
            Attractor::new(Vec2::new(10.0, 10.0), &Parameters::default(), &Config::default());
        assert!(attractor.is_inside_horizon(Vec2::new(20.0, 10.0)));
        assert!(!attractor.is_inside_horizon(Vec2::new(30.0, 10.0)));
    }
}
