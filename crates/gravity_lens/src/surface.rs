//! Convert a rendered canvas into terminal cells, and write text over them.

use color_eyre::eyre::Result;
use gravity_engine::canvas::{Canvas, Colour, WHITE};
use termwiz::surface::Change as TermwizChange;
use termwiz::surface::Position as TermwizPosition;

/// The upper half block. Its foreground colour is the upper pixel and its background colour is
/// the lower pixel.
const HALF_BLOCK: &str = "▀";

/// A frame ready for the user's terminal.
#[derive(Clone)]
pub(crate) struct Surface {
    /// The terminal's width
    pub width: usize,
    /// The terminal's height
    pub height: usize,
    /// A surface of terminal cells
    pub surface: termwiz::surface::Surface,
}

impl Surface {
    /// An empty frame.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            surface: termwiz::surface::Surface::new(width, height),
        }
    }

    /// Build a frame from a canvas with 2 pixels per cell. The canvas should be `width` pixels
    /// wide and `height * 2` pixels high. Cells without pixels are left blank.
    #[must_use]
    pub fn from_canvas(canvas: &Canvas, width: usize, height: usize) -> Self {
        let mut frame = Self::new(width, height);

        for row in 0..height {
            frame.surface.add_change(TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(0),
                y: TermwizPosition::Absolute(row),
            });
            for col in 0..width {
                let upper = canvas.pixel(col, row * 2);
                let lower = canvas.pixel(col, row * 2 + 1);
                let Some(upper_colour) = upper else {
                    break;
                };
                let lower_change = lower.map_or_else(Self::make_default_bg_colour, |colour| {
                    Self::make_bg_colour(colour)
                });
                frame
                    .surface
                    .add_changes(vec![Self::make_fg_colour(upper_colour), lower_change]);
                frame.surface.add_change(HALF_BLOCK);
            }
        }

        frame
    }

    /// Overlay text at a given coord with the given colours.
    pub fn add_text(
        &mut self,
        x: usize,
        y: usize,
        text: &str,
        maybe_background_colour: Option<Colour>,
        maybe_foreground_colour: Option<Colour>,
    ) -> Result<()> {
        if y >= self.height {
            color_eyre::eyre::bail!("Tried to add text to row: {y}");
        }

        let bg_colour = maybe_background_colour
            .map_or_else(Self::make_default_bg_colour, |colour| {
                Self::make_bg_colour(colour)
            });
        let fg_colour = maybe_foreground_colour
            .map_or_else(|| Self::make_fg_colour(WHITE), Self::make_fg_colour);

        let available = self.width.saturating_sub(x);
        let clipped: String = text.chars().take(available).collect();

        self.surface.add_changes(vec![
            TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(x),
                y: TermwizPosition::Absolute(y),
            },
            bg_colour,
            fg_colour,
        ]);
        self.surface.add_change(clipped);

        Ok(())
    }

    /// Make a Termwiz colour attribute
    #[must_use]
    pub const fn make_colour_attribute(colour: Colour) -> termwiz::color::ColorAttribute {
        termwiz::color::ColorAttribute::TrueColorWithDefaultFallback(termwiz::color::SrgbaTuple(
            colour.0, colour.1, colour.2, colour.3,
        ))
    }

    /// Make a Termwiz background colour
    #[must_use]
    pub const fn make_bg_colour(colour: Colour) -> TermwizChange {
        let colour_attribute = Self::make_colour_attribute(colour);
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Background(colour_attribute))
    }

    /// The terminal's own background colour.
    #[must_use]
    pub const fn make_default_bg_colour() -> TermwizChange {
        let colour_attribute = termwiz::color::ColorAttribute::Default;
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Background(colour_attribute))
    }

    /// Make a Termwiz foreground colour
    #[must_use]
    pub const fn make_fg_colour(colour: Colour) -> TermwizChange {
        let colour_attribute = Self::make_colour_attribute(colour);
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Foreground(colour_attribute))
    }
}
