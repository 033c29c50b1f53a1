//! The heads-up display in the top-left corner.

use std::collections::VecDeque;

use color_eyre::eyre::Result;
use gravity_engine::params::Parameters;

/// How many frames the frame time is averaged over.
const FRAME_TIME_SAMPLES: usize = 30;

/// The HUD's text colour.
const TEXT_COLOUR: gravity_engine::canvas::Colour = (0.133, 0.827, 0.933, 1.0);

/// The HUD's background, so it's readable over the grid.
const BACKGROUND_COLOUR: gravity_engine::canvas::Colour = (0.0, 0.0, 0.0, 0.7);

/// A rolling window of how long frames took to compute.
#[derive(Debug, Default)]
pub(crate) struct FrameTimes {
    /// The most recent frame times, oldest first.
    samples: VecDeque<std::time::Duration>,
}

impl FrameTimes {
    /// Add the latest frame time, forgetting the oldest one if needed.
    pub fn record(&mut self, duration: std::time::Duration) {
        if self.samples.len() == FRAME_TIME_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(duration);
    }

    /// The mean of the recorded frame times.
    pub fn average(&self) -> Option<std::time::Duration> {
        let count = u32::try_from(self.samples.len()).ok()?;
        if count == 0 {
            return None;
        }
        let total: std::time::Duration = self.samples.iter().sum();
        Some(total / count)
    }
}

/// What the HUD shows.
#[derive(Debug)]
pub(crate) struct Readout<'readout> {
    /// The live parameters.
    pub parameters: &'readout Parameters,
    /// How many particles are alive.
    pub particle_count: usize,
    /// The population cap.
    pub max_particles: usize,
    /// Whether the simulation is paused.
    pub is_paused: bool,
    /// The average time between frames.
    pub frame_time: Option<std::time::Duration>,
}

/// The lines of text in the HUD.
pub(crate) fn lines(readout: &Readout<'_>) -> Vec<String> {
    let parameters = readout.parameters;
    let mut lines = vec![
        "Gravity Lens".to_owned(),
        format!("Mass       {:.1}", parameters.mass),
        format!("G          {:.2}", parameters.gravitational_constant),
        format!("Grid       {:.0}", parameters.grid_spacing),
        format!("Time       {:.2}x", parameters.time_scale),
        format!("Model      {}", parameters.model.name()),
        format!(
            "Particles  {}/{}",
            readout.particle_count, readout.max_particles
        ),
    ];

    if let Some(frame_time) = readout.frame_time {
        let seconds = frame_time.as_secs_f32();
        if seconds > 0.0 {
            lines.push(format!(
                "FPS        {:.0} ({:.1}ms)",
                1.0 / seconds,
                seconds * 1000.0
            ));
        }
    }

    if readout.is_paused {
        lines.push("PAUSED".to_owned());
    }

    lines
}

/// Write the HUD onto a frame.
pub(crate) fn draw(surface: &mut crate::surface::Surface, readout: &Readout<'_>) -> Result<()> {
    for (row, line) in lines(readout).iter().enumerate() {
        if row >= surface.height {
            break;
        }
        surface.add_text(
            1,
            row,
            &format!(" {line} "),
            Some(BACKGROUND_COLOUR),
            Some(TEXT_COLOUR),
        )?;
    }
    Ok(())
}
