//! Bending the reference grid to look like light bending around the attractor.
//!
//! The falloff is an empirical inverse cube keyed on the mass. Grid points within the lensing
//! reach are pulled towards the attractor, hardest near the centre and not at all at the edge of
//! the reach. No point is ever pulled past the horizon.

use glam::Vec2;

use crate::attractor::Attractor;

/// How far a point at `point` is pulled towards the attractor.
///
/// Zero beyond the lensing reach and inside the horizon. Just outside the horizon the pull is
/// capped to the distance left to it, so it grows with distance until it meets the falloff.
/// It only shrinks with distance beyond that band.
#[must_use]
pub fn displacement(point: Vec2, attractor: &Attractor, strength: f32) -> f32 {
    let distance = attractor.distance_to(point);
    let reach = attractor.lensing_reach;
    let horizon = attractor.schwarzschild_radius;
    if distance >= reach || distance <= horizon {
        return 0.0;
    }

    let pull = strength * reach * (1.0 - distance / reach).powi(3);
    pull.min(distance - horizon)
}

/// Where a grid point appears to be after lensing.
#[must_use]
pub fn distort(point: Vec2, attractor: &Attractor, strength: f32) -> Vec2 {
    let amount = displacement(point, attractor, strength);
    if amount <= 0.0 {
        return point;
    }
    point + (attractor.position - point).normalize_or_zero() * amount
}

/// A single straight line of the undistorted grid.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum GridLine {
    /// Runs the full width at this height.
    Horizontal {
        /// Height of the line.
        y: f32,
    },
    /// Runs the full height at this x coordinate.
    Vertical {
        /// Horizontal position of the line.
        x: f32,
    },
}

/// The reference grid covering the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Lattice {
    /// Width of the viewport in world units.
    pub width: f32,
    /// Height of the viewport in world units.
    pub height: f32,
    /// Distance between neighbouring lines.
    pub spacing: f32,
    /// Distance between samples along a line.
    pub step: f32,
}

impl Lattice {
    /// The smallest distance between samples along a line.
    pub const MIN_STEP: f32 = 20.0;

    /// Cover a viewport with lines `spacing` apart.
    #[must_use]
    pub fn new(viewport: Vec2, spacing: f32) -> Self {
        let spacing = spacing.max(1.0);
        Self {
            width: viewport.x.max(0.0),
            height: viewport.y.max(0.0),
            spacing,
            step: Self::MIN_STEP.max(spacing / 1.5),
        }
    }

    /// Evenly spaced positions from 0 to `length`, always ending exactly on `length`.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "Lengths are small, positive and finite"
    )]
    fn positions(length: f32, step: f32) -> impl Iterator<Item = f32> {
        let count = (length / step).floor() as usize;
        let remainder = length - count as f32 * step;
        let end = (remainder > f32::EPSILON).then_some(length);
        (0..=count).map(move |index| index as f32 * step).chain(end)
    }

    /// Every horizontal line, then every vertical line.
    pub fn lines(&self) -> impl Iterator<Item = GridLine> {
        let horizontal = Self::offsets(self.height, self.spacing).map(|y| GridLine::Horizontal { y });
        let vertical = Self::offsets(self.width, self.spacing).map(|x| GridLine::Vertical { x });
        horizontal.chain(vertical)
    }

    /// Line positions from 0 up to and including `length`, never beyond it.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "Lengths are small, positive and finite"
    )]
    fn offsets(length: f32, spacing: f32) -> impl Iterator<Item = f32> {
        let count = (length / spacing).floor() as usize;
        (0..=count).map(move |index| index as f32 * spacing)
    }

    /// Undistorted sample points along a line.
    pub fn samples(&self, line: GridLine) -> impl Iterator<Item = Vec2> {
        let (length, origin, direction) = match line {
            GridLine::Horizontal { y } => (self.width, Vec2::new(0.0, y), Vec2::X),
            GridLine::Vertical { x } => (self.height, Vec2::new(x, 0.0), Vec2::Y),
        };
        Self::positions(length, self.step).map(move |along| origin + direction * along)
    }

    /// Sample points along a line after lensing.
    pub fn warped<'attractor>(
        &self,
        line: GridLine,
        attractor: &'attractor Attractor,
        strength: f32,
    ) -> impl Iterator<Item = Vec2> + 'attractor {
        self.samples(line)
            .map(move |point| distort(point, attractor, strength))
    }
}
