//! Draw a whole frame onto a canvas.
//!
//! Layers are painted back to front: the background, the lensed grid, the particles, then the
//! attractor's glow, its black horizon and finally the photon ring on top of everything.

use glam::Vec2;

use crate::attractor::Attractor;
use crate::canvas::{Canvas, Colour, TRANSPARENT, WHITE};
use crate::config::Config;
use crate::errors::Result;
use crate::lensing::Lattice;
use crate::particle::Particle;

/// The accretion glow, from the horizon (0.0) to the outer edge of the disk (1.0).
pub const GLOW_STOPS: [(f32, Colour); 5] = [
    (0.0, WHITE),
    (0.05, WHITE),
    (0.15, (0.133, 0.827, 0.933, 1.0)),
    (0.4, (0.024, 0.714, 0.831, 0.3)),
    (1.0, TRANSPARENT),
];

/// Everything needed to draw a single frame.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Scene<'scene, P: Iterator<Item = &'scene Particle> + Clone> {
    /// Tunables, mostly the colours.
    pub config: &'scene Config,
    /// The attractor as of this frame.
    pub attractor: &'scene Attractor,
    /// The size of the visible world.
    pub viewport: Vec2,
    /// Distance between the reference grid's lines.
    pub grid_spacing: f32,
    /// All the live particles.
    pub particles: P,
    /// How many world units fit in a single pixel.
    pub scale: f32,
}

impl<'scene, P: Iterator<Item = &'scene Particle> + Clone> Scene<'scene, P> {
    /// Convert world units to pixels.
    fn to_pixels(&self, point: Vec2) -> Vec2 {
        point / self.scale
    }

    /// Convert a world distance to pixels.
    fn length_to_pixels(&self, length: f32) -> f32 {
        length / self.scale
    }
}

/// Draw a whole frame.
///
/// # Errors
/// When the canvas has no pixels. Nothing is drawn and the frame should just be skipped.
pub fn draw<'scene, P>(canvas: &mut Canvas, scene: &Scene<'scene, P>) -> Result<()>
where
    P: Iterator<Item = &'scene Particle> + Clone,
{
    canvas.ensure_drawable()?;
    if !(scene.scale.is_finite() && scene.scale > 0.0) {
        tracing::warn!("Not drawing frame with unusable scale: {}", scene.scale);
        return Ok(());
    }

    canvas.fill(scene.config.colours.background);
    draw_grid(canvas, scene);
    for particle in scene.particles.clone() {
        draw_particle(canvas, scene, particle);
    }
    draw_attractor(canvas, scene);

    Ok(())
}

/// The reference grid, bent by lensing.
fn draw_grid<'scene, P>(canvas: &mut Canvas, scene: &Scene<'scene, P>)
where
    P: Iterator<Item = &'scene Particle> + Clone,
{
    let lattice = Lattice::new(scene.viewport, scene.grid_spacing);
    let strength = scene.config.lensing_strength;
    let colour = scene.config.colours.grid;

    for line in lattice.lines() {
        let mut previous: Option<Vec2> = None;
        for point in lattice.warped(line, scene.attractor, strength) {
            let pixel = scene.to_pixels(point);
            if let Some(from) = previous {
                canvas.stroke_line(from, pixel, colour);
            }
            previous = Some(pixel);
        }
    }
}

/// A fading trail with a bright head.
#[expect(
    clippy::as_conversions,
    clippy::cast_precision_loss,
    reason = "Trails are short"
)]
fn draw_particle<'scene, P>(canvas: &mut Canvas, scene: &Scene<'scene, P>, particle: &Particle)
where
    P: Iterator<Item = &'scene Particle> + Clone,
{
    let length = particle.trail.len() as f32;
    let mut previous: Option<Vec2> = None;
    for (index, point) in particle.trail.iter().enumerate() {
        let pixel = scene.to_pixels(point);
        if let Some(from) = previous {
            let opacity = (index as f32 / length) * scene.config.trail_opacity;
            let (red, green, blue, alpha) = particle.colour;
            canvas.stroke_line(from, pixel, (red, green, blue, alpha * opacity));
        }
        previous = Some(pixel);
    }

    canvas.fill_disc(
        scene.to_pixels(particle.position),
        scene.length_to_pixels(scene.config.particle_radius),
        scene.config.colours.particle_head,
    );
}

/// The glow, the horizon and the photon ring.
fn draw_attractor<'scene, P>(canvas: &mut Canvas, scene: &Scene<'scene, P>)
where
    P: Iterator<Item = &'scene Particle> + Clone,
{
    let attractor = scene.attractor;
    let centre = scene.to_pixels(attractor.position);

    canvas.fill_radial_gradient(
        centre,
        scene.length_to_pixels(attractor.accretion_inner_radius),
        scene.length_to_pixels(attractor.accretion_outer_radius),
        &GLOW_STOPS,
    );
    canvas.fill_disc(
        centre,
        scene.length_to_pixels(attractor.schwarzschild_radius),
        crate::canvas::BLACK,
    );
    canvas.stroke_ring(
        centre,
        scene.length_to_pixels(attractor.photon_sphere_radius),
        scene.config.colours.photon_ring,
    );
}
