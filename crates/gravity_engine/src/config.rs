//! All the tunables of the physics and the rendering.
//!
//! Distances are in world units and times are in nominal frames. So the speed of light, for
//! example, is measured in world units per frame.

use snafu::ensure;

use crate::canvas::Colour;
use crate::errors::{InvalidConfigSnafu, Result};

/// All the config for the engine
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// The speed of light, `c`, in world units per frame.
    pub speed_of_light: f32,
    /// No particle may travel faster than this fraction of `c`.
    pub max_speed_fraction: f32,
    /// The user-facing gravitational constant is multiplied by this so that it acts sensibly in
    /// world units.
    pub g_scale: f32,
    /// The maximum number of particles alive at once.
    pub max_particles: usize,
    /// How many recent positions each particle remembers for drawing its trail.
    pub trail_length: usize,
    /// The maximum magnitude of acceleration in a single frame.
    ///
    /// This is a design constant, not derived from physics. Close to the horizon the effective
    /// distance hits `horizon_epsilon` and this clamp is the only thing stopping a particle from
    /// being flung across the universe in one frame.
    pub force_clamp: f32,
    /// The floor for the distance from the horizon, `d - Rs`.
    pub horizon_epsilon: f32,
    /// Number of particles added per spawn burst.
    pub burst_size: usize,
    /// How far outside the viewport edge new particles appear.
    pub spawn_margin: f32,
    /// Orbit injection is only attempted when the spawn point is further than this many horizon
    /// radii from the attractor.
    pub injection_margin: f32,
    /// Particles this far outside the viewport are considered lost.
    pub escape_margin: f32,
    /// The lensing cutoff radius, scaled by the square root of the mass.
    pub lensing_reach: f32,
    /// The lensing cutoff radius is never less than this many horizon radii.
    pub min_reach_factor: f32,
    /// The peak grid displacement as a fraction of the lensing reach.
    pub lensing_strength: f32,
    /// The photon sphere's radius in horizon radii.
    pub photon_sphere_factor: f32,
    /// Where the accretion glow starts, in horizon radii.
    pub accretion_inner_factor: f32,
    /// Where the accretion glow fades to nothing, in horizon radii.
    pub accretion_outer_factor: f32,
    /// Softening used by the Newtonian model to avoid the singularity.
    pub newtonian_softening: f32,
    /// Radius of a particle's head in world units.
    pub particle_radius: f32,
    /// The opacity of the newest part of a particle's trail.
    pub trail_opacity: f32,
    /// The colours of everything that isn't a particle.
    pub colours: Colours,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed_of_light: 20.0,
            max_speed_fraction: 0.9,
            g_scale: 1000.0,
            max_particles: 300,
            trail_length: 25,
            force_clamp: 5.0,
            horizon_epsilon: 1.0,
            burst_size: 12,
            spawn_margin: 50.0,
            injection_margin: 2.0,
            escape_margin: 3000.0,
            lensing_reach: 120.0,
            min_reach_factor: 3.0,
            lensing_strength: 0.4,
            photon_sphere_factor: 1.5,
            accretion_inner_factor: 1.0,
            accretion_outer_factor: 5.0,
            newtonian_softening: 100.0,
            particle_radius: 2.0,
            trail_opacity: 0.6,
            colours: Colours::default(),
        }
    }
}

/// Colours as RGBA tuples with components in `0.0..=1.0`.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Colours {
    /// The empty void.
    pub background: Colour,
    /// The reference grid that gets warped by lensing.
    pub grid: Colour,
    /// The thin ring at the photon sphere.
    pub photon_ring: Colour,
    /// The dot at the head of every particle.
    pub particle_head: Colour,
}

impl Default for Colours {
    fn default() -> Self {
        Self {
            background: crate::canvas::BLACK,
            grid: (0.024, 0.714, 0.831, 0.15),
            photon_ring: crate::canvas::WHITE,
            particle_head: crate::canvas::WHITE,
        }
    }
}

impl Config {
    /// The absolute speed limit for all particles.
    #[must_use]
    pub fn max_speed(&self) -> f32 {
        self.speed_of_light * self.max_speed_fraction
    }

    /// Reject values that would make the simulation meaningless or unbounded.
    ///
    /// # Errors
    /// The first field found with an unusable value.
    pub fn validate(&self) -> Result<()> {
        Self::ensure_positive("speed_of_light", self.speed_of_light)?;
        ensure!(
            self.max_speed_fraction > 0.0 && self.max_speed_fraction <= 1.0,
            InvalidConfigSnafu {
                field: "max_speed_fraction",
                reason: format!("must be in (0, 1], got {}", self.max_speed_fraction),
            }
        );
        Self::ensure_positive("g_scale", self.g_scale)?;
        Self::ensure_positive("force_clamp", self.force_clamp)?;
        Self::ensure_positive("horizon_epsilon", self.horizon_epsilon)?;
        Self::ensure_positive("lensing_reach", self.lensing_reach)?;
        Self::ensure_positive("photon_sphere_factor", self.photon_sphere_factor)?;
        Self::ensure_positive("newtonian_softening", self.newtonian_softening)?;
        Self::ensure_positive("particle_radius", self.particle_radius)?;
        ensure!(
            self.max_particles > 0,
            InvalidConfigSnafu {
                field: "max_particles",
                reason: "must allow at least one particle",
            }
        );
        ensure!(
            self.trail_length > 0,
            InvalidConfigSnafu {
                field: "trail_length",
                reason: "must keep at least one position",
            }
        );
        ensure!(
            self.accretion_outer_factor > self.accretion_inner_factor,
            InvalidConfigSnafu {
                field: "accretion_outer_factor",
                reason: "must be larger than `accretion_inner_factor`",
            }
        );
        ensure!(
            self.injection_margin >= 1.0,
            InvalidConfigSnafu {
                field: "injection_margin",
                reason: "orbits can't be injected inside the horizon",
            }
        );

        Ok(())
    }

    /// Finite and greater than zero.
    fn ensure_positive(field: &str, value: f32) -> Result<()> {
        ensure!(
            value.is_finite() && value > 0.0,
            InvalidConfigSnafu {
                field,
                reason: format!("must be positive, got {value}"),
            }
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
        assert!((Config::default().max_speed() - 18.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            "
                max_particles = 10
                [colours]
                grid = [1.0, 0.0, 0.0, 0.5]
            ",
        )
        .unwrap();
        assert_eq!(config.max_particles, 10);
        assert_eq!(config.colours.grid, (1.0, 0.0, 0.0, 0.5));
        assert_eq!(config.trail_length, Config::default().trail_length);
    }

    #[test]
    fn rejects_faster_than_light() {
        let mut config = Config::default();
        config.max_speed_fraction = 1.5;
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("max_speed_fraction"));
    }

    #[test]
    fn rejects_zero_particles() {
        let mut config = Config::default();
        config.max_particles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan() {
        let mut config = Config::default();
        config.speed_of_light = f32::NAN;
        assert!(config.validate().is_err());
    }
}
