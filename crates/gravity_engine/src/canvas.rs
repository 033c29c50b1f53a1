//! A simple RGBA pixel buffer to draw frames onto.
//!
//! Coordinates are in pixels, with pixel `(x, y)` covering the square from `(x, y)` to
//! `(x + 1, y + 1)`. Everything drawn outside the buffer is silently clipped.

use glam::Vec2;

use crate::errors::{Result, SurfaceUnavailableSnafu};

/// A colour as `(red, green, blue, alpha)`, each in `0.0..=1.0`.
pub type Colour = (f32, f32, f32, f32);

/// Opaque white.
pub const WHITE: Colour = (1.0, 1.0, 1.0, 1.0);
/// Opaque black.
pub const BLACK: Colour = (0.0, 0.0, 0.0, 1.0);
/// Nothing at all.
pub const TRANSPARENT: Colour = (0.0, 0.0, 0.0, 0.0);

/// The most pixels a single line will ever plot. Lines are clipped to the canvas first, so this
/// only matters for enormous canvases.
const MAX_LINE_STEPS: usize = 16_384;

/// Composite `source` over `destination`, like a painter would.
#[must_use]
pub fn blend(source: Colour, destination: Colour) -> Colour {
    let source_alpha = source.3.clamp(0.0, 1.0);
    let destination_alpha = destination.3.clamp(0.0, 1.0);
    let alpha = source_alpha + destination_alpha * (1.0 - source_alpha);
    if alpha <= 0.0 {
        return TRANSPARENT;
    }

    let mix = |source_component: f32, destination_component: f32| {
        (source_component * source_alpha
            + destination_component * destination_alpha * (1.0 - source_alpha))
            / alpha
    };
    (
        mix(source.0, destination.0),
        mix(source.1, destination.1),
        mix(source.2, destination.2),
        alpha,
    )
}

/// The colour at `position` (`0.0..=1.0`) along a gradient. Stops must be sorted by position.
/// Before the first and after the last stop the end colours are extended.
#[must_use]
pub fn sample_gradient(stops: &[(f32, Colour)], position: f32) -> Colour {
    let Some(first) = stops.first() else {
        return TRANSPARENT;
    };
    if position <= first.0 {
        return first.1;
    }

    for pair in stops.windows(2) {
        if let [(start, from), (end, to)] = pair {
            if position <= *end {
                let span = end - start;
                let amount = if span > 0.0 { (position - start) / span } else { 1.0 };
                let lerp = |a: f32, b: f32| a + (b - a) * amount;
                return (
                    lerp(from.0, to.0),
                    lerp(from.1, to.1),
                    lerp(from.2, to.2),
                    lerp(from.3, to.3),
                );
            }
        }
    }

    stops.last().map_or(TRANSPARENT, |last| last.1)
}

/// A 2D grid of pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    /// Width in pixels.
    width: usize,
    /// Height in pixels.
    height: usize,
    /// Row-major pixels.
    pixels: Vec<Colour>,
}

impl Canvas {
    /// Make a transparent canvas.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![TRANSPARENT; width * height],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Change the size, losing all the current pixels.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, TRANSPARENT);
    }

    /// Check that there's actually something to draw on.
    ///
    /// # Errors
    /// When either dimension is zero.
    pub fn ensure_drawable(&self) -> Result<()> {
        snafu::ensure!(
            self.width > 0 && self.height > 0,
            SurfaceUnavailableSnafu {
                width: self.width,
                height: self.height
            }
        );
        Ok(())
    }

    /// Overwrite every pixel.
    pub fn fill(&mut self, colour: Colour) {
        self.pixels.fill(colour);
    }

    /// The index of a pixel, if it's on the canvas.
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Get a single pixel.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Composite a colour onto a single pixel. Pixels off the canvas are ignored.
    pub fn blend_pixel(&mut self, x: i64, y: i64, colour: Colour) {
        if let Some(index) = self.index(x, y) {
            if let Some(pixel) = self.pixels.get_mut(index) {
                *pixel = blend(colour, *pixel);
            }
        }
    }

    /// The pixel containing a point.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        reason = "Points are clipped to the canvas before being converted"
    )]
    fn pixel_at(point: Vec2) -> (i64, i64) {
        (point.x.floor() as i64, point.y.floor() as i64)
    }

    /// Clip a line to just beyond the edges of the canvas, using Liang–Barsky.
    fn clip(&self, from: Vec2, to: Vec2) -> Option<(Vec2, Vec2)> {
        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Canvas dimensions are small"
        )]
        let max = Vec2::new(self.width as f32 + 1.0, self.height as f32 + 1.0);
        let min = Vec2::splat(-1.0);
        let delta = to - from;

        let mut enter: f32 = 0.0;
        let mut exit: f32 = 1.0;
        for (direction, distance) in [
            (-delta.x, from.x - min.x),
            (delta.x, max.x - from.x),
            (-delta.y, from.y - min.y),
            (delta.y, max.y - from.y),
        ] {
            if direction == 0.0 {
                if distance < 0.0 {
                    return None;
                }
                continue;
            }
            let ratio = distance / direction;
            if direction < 0.0 {
                enter = enter.max(ratio);
            } else {
                exit = exit.min(ratio);
            }
            if enter > exit {
                return None;
            }
        }

        Some((from + delta * enter, from + delta * exit))
    }

    /// Draw a 1 pixel wide line.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "The line has already been clipped to the canvas"
    )]
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, colour: Colour) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let Some((start, end)) = self.clip(from, to) else {
            return;
        };

        let delta = end - start;
        let steps = (delta.x.abs().max(delta.y.abs()).ceil() as usize).clamp(1, MAX_LINE_STEPS);
        let increment = delta / steps as f32;
        let mut previous = None;
        for step in 0..=steps {
            let pixel = Self::pixel_at(start + increment * step as f32);
            if previous != Some(pixel) {
                self.blend_pixel(pixel.0, pixel.1, colour);
                previous = Some(pixel);
            }
        }
    }

    /// The range of pixels that could be touched by a circle.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "Bounds are clamped to the canvas"
    )]
    fn bounds(&self, centre: Vec2, radius: f32) -> (i64, i64, i64, i64) {
        let clamp_x = |value: f32| value.clamp(0.0, self.width as f32) as i64;
        let clamp_y = |value: f32| value.clamp(0.0, self.height as f32) as i64;
        (
            clamp_x((centre.x - radius).floor()),
            clamp_x((centre.x + radius).ceil()),
            clamp_y((centre.y - radius).floor()),
            clamp_y((centre.y + radius).ceil()),
        )
    }

    /// Call `paint` for every pixel near a circle, with the distance from the circle's centre
    /// to the pixel's centre.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Pixel coordinates are small"
    )]
    fn for_each_near<F: FnMut(&mut Self, i64, i64, f32)>(
        &mut self,
        centre: Vec2,
        radius: f32,
        mut paint: F,
    ) {
        if !centre.is_finite() || !radius.is_finite() {
            return;
        }
        let (left, right, top, bottom) = self.bounds(centre, radius + 1.0);
        for y in top..bottom {
            for x in left..right {
                let pixel_centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                paint(self, x, y, pixel_centre.distance(centre));
            }
        }
    }

    /// A filled circle. Even the tiniest circle covers at least the pixel its centre is in.
    pub fn fill_disc(&mut self, centre: Vec2, radius: f32, colour: Colour) {
        let mut painted = false;
        self.for_each_near(centre, radius, |canvas, x, y, distance| {
            if distance <= radius {
                canvas.blend_pixel(x, y, colour);
                painted = true;
            }
        });
        if !painted && centre.is_finite() {
            let (x, y) = Self::pixel_at(centre);
            self.blend_pixel(x, y, colour);
        }
    }

    /// A circle outline about a pixel wide.
    pub fn stroke_ring(&mut self, centre: Vec2, radius: f32, colour: Colour) {
        self.for_each_near(centre, radius, |canvas, x, y, distance| {
            if (distance - radius).abs() <= 0.5 {
                canvas.blend_pixel(x, y, colour);
            }
        });
    }

    /// A filled circle coloured by a gradient that runs from `inner` (position 0.0) to `outer`
    /// (position 1.0).
    pub fn fill_radial_gradient(
        &mut self,
        centre: Vec2,
        inner: f32,
        outer: f32,
        stops: &[(f32, Colour)],
    ) {
        let span = outer - inner;
        if span <= 0.0 {
            return;
        }
        self.for_each_near(centre, outer, |canvas, x, y, distance| {
            if distance <= outer {
                let position = ((distance - inner) / span).clamp(0.0, 1.0);
                canvas.blend_pixel(x, y, sample_gradient(stops, position));
            }
        });
    }

    /// Every pixel as 8 bit RGBA, row by row.
    #[expect(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Components are clamped to 0..=255 first"
    )]
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        let to_byte = |component: f32| (component.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.pixels
            .iter()
            .flat_map(|pixel| {
                [
                    to_byte(pixel.0),
                    to_byte(pixel.1),
                    to_byte(pixel.2),
                    to_byte(pixel.3),
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(left: Colour, right: Colour) -> bool {
        (left.0 - right.0).abs() < 0.001
            && (left.1 - right.1).abs() < 0.001
            && (left.2 - right.2).abs() < 0.001
            && (left.3 - right.3).abs() < 0.001
    }

    #[test]
    fn blending_opaque_replaces() {
        assert_eq!(blend(WHITE, BLACK), WHITE);
    }

    #[test]
    fn blending_transparent_keeps() {
        assert_eq!(blend(TRANSPARENT, BLACK), BLACK);
    }

    #[test]
    fn blending_half() {
        let blended = blend((1.0, 1.0, 1.0, 0.5), BLACK);
        assert!(close(blended, (0.5, 0.5, 0.5, 1.0)));
    }

    #[test]
    fn gradient_interpolates() {
        let stops = [(0.0, WHITE), (1.0, BLACK)];
        assert!(close(sample_gradient(&stops, 0.5), (0.5, 0.5, 0.5, 1.0)));
        assert_eq!(sample_gradient(&stops, -1.0), WHITE);
        assert_eq!(sample_gradient(&stops, 2.0), BLACK);
        assert_eq!(sample_gradient(&[], 0.5), TRANSPARENT);
    }

    #[test]
    fn horizontal_line() {
        let mut canvas = Canvas::new(5, 3);
        canvas.fill(BLACK);
        canvas.stroke_line(Vec2::new(0.5, 1.5), Vec2::new(4.5, 1.5), WHITE);
        for x in 0..5 {
            assert_eq!(canvas.pixel(x, 1), Some(WHITE));
            assert_eq!(canvas.pixel(x, 0), Some(BLACK));
        }
    }

    #[test]
    fn lines_are_clipped() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill(BLACK);
        canvas.stroke_line(Vec2::new(-1000.0, 2.5), Vec2::new(1000.0, 2.5), WHITE);
        assert_eq!(canvas.pixel(0, 2), Some(WHITE));
        assert_eq!(canvas.pixel(3, 2), Some(WHITE));
        canvas.stroke_line(Vec2::new(-10.0, -10.0), Vec2::new(-5.0, -20.0), WHITE);
        canvas.stroke_line(Vec2::new(f32::NAN, 0.0), Vec2::ONE, WHITE);
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn tiny_discs_still_show() {
        let mut canvas = Canvas::new(4, 4);
        canvas.fill_disc(Vec2::new(2.1, 2.1), 0.1, WHITE);
        assert_eq!(canvas.pixel(2, 2), Some(WHITE));
    }

    #[test]
    fn discs_are_filled() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill(WHITE);
        canvas.fill_disc(Vec2::new(5.0, 5.0), 3.0, BLACK);
        assert_eq!(canvas.pixel(5, 5), Some(BLACK));
        assert_eq!(canvas.pixel(4, 4), Some(BLACK));
        assert_eq!(canvas.pixel(0, 0), Some(WHITE));
    }

    #[test]
    fn rings_are_hollow() {
        let mut canvas = Canvas::new(20, 20);
        canvas.fill(BLACK);
        canvas.stroke_ring(Vec2::new(10.0, 10.0), 5.0, WHITE);
        assert_eq!(canvas.pixel(10, 10), Some(BLACK));
        assert_eq!(canvas.pixel(14, 10), Some(WHITE));
    }

    #[test]
    fn gradient_discs_fade_out() {
        let mut canvas = Canvas::new(40, 40);
        canvas.fill(BLACK);
        let stops = [(0.0, WHITE), (1.0, TRANSPARENT)];
        canvas.fill_radial_gradient(Vec2::new(20.0, 20.0), 0.0, 15.0, &stops);
        let near = canvas.pixel(20, 20).unwrap();
        let far = canvas.pixel(32, 20).unwrap();
        assert!(near.0 > far.0);
        assert_eq!(canvas.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn empty_canvases_are_not_drawable() {
        let canvas = Canvas::new(0, 10);
        assert!(canvas.ensure_drawable().unwrap_err().is_surface_unavailable());
        assert!(Canvas::new(1, 1).ensure_drawable().is_ok());
    }

    #[test]
    fn resizing_reallocates() {
        let mut canvas = Canvas::new(2, 2);
        canvas.fill(WHITE);
        canvas.resize(3, 1);
        assert_eq!(canvas.pixel(2, 0), Some(TRANSPARENT));
        assert_eq!(canvas.pixel(0, 1), None);
    }

    #[test]
    fn rgba8_export() {
        let mut canvas = Canvas::new(1, 1);
        canvas.fill((1.0, 0.5, 0.0, 1.0));
        assert_eq!(canvas.to_rgba8(), vec![255, 128, 0, 255]);
    }
}
