//! Errors for the engine.
//!
//! Most degenerate situations in a real-time simulation are not errors at all, they're clamped
//! or skipped. So the only things that surface here are bad config and a surface with nothing
//! to draw on.

/// Convenience alias used throughout the engine.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// All the known errors returned by this crate.
#[derive(Debug, snafu::Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum EngineError {
    #[snafu(display("Invalid config value for `{field}`: {reason}"))]
    /// A config value that the engine can't simulate with.
    InvalidConfig {
        /// The name of the offending config field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    #[snafu(display("Drawing surface unavailable ({width}x{height})"))]
    /// The canvas has no pixels. Callers should skip the frame and try again on the next one.
    SurfaceUnavailable {
        /// Width of the canvas in pixels.
        width: usize,
        /// Height of the canvas in pixels.
        height: usize,
    },
}

impl EngineError {
    /// Whether this error just means "nothing to draw on this frame".
    #[must_use]
    pub const fn is_surface_unavailable(&self) -> bool {
        matches!(self, Self::SurfaceUnavailable { .. })
    }
}
