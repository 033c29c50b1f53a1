//! Run the simulation without a terminal and save the last frame as a PNG.

use color_eyre::eyre::{ContextCompat as _, Result};
use glam::Vec2;
use gravity_engine::canvas::Canvas;
use gravity_engine::Simulation;

/// How to take a snapshot.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    /// Where to save the PNG.
    pub path: std::path::PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// How many frames to simulate.
    pub frames: u32,
    /// How many bursts of particles to spawn, spread evenly over the first frames.
    pub bursts: u32,
    /// Seed for reproducible snapshots.
    pub seed: Option<u64>,
}

impl Snapshot {
    /// Collect the snapshot settings from the CLI.
    pub fn from_cli(cli_args: &crate::cli_args::CliArgs) -> Option<Self> {
        let path = cli_args.snapshot.clone()?;
        Some(Self {
            path,
            width: cli_args.snapshot_width,
            height: cli_args.snapshot_height,
            frames: cli_args.snapshot_frames,
            bursts: cli_args.snapshot_bursts,
            seed: cli_args.seed,
        })
    }

    /// Simulate and save. One world unit is one pixel.
    pub fn run(
        &self,
        engine: gravity_engine::config::Config,
        parameters: gravity_engine::params::Parameters,
    ) -> Result<()> {
        color_eyre::eyre::ensure!(
            self.width > 0 && self.height > 0,
            "Snapshot must be at least 1x1 pixels, got {}x{}",
            self.width,
            self.height
        );

        let canvas = self.simulate(engine, parameters)?;
        let image = image::RgbaImage::from_raw(self.width, self.height, canvas.to_rgba8())
            .context("Canvas and snapshot sizes don't match")?;
        image.save(&self.path)?;

        tracing::info!("Saved snapshot to {:?}", self.path);
        Ok(())
    }

    /// Run all the frames and render the last one.
    fn simulate(
        &self,
        engine: gravity_engine::config::Config,
        parameters: gravity_engine::params::Parameters,
    ) -> Result<Canvas> {
        let width = usize::try_from(self.width)?;
        let height = usize::try_from(self.height)?;
        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Image sizes are nowhere near big enough to lose precision"
        )]
        let viewport = Vec2::new(self.width as f32, self.height as f32);

        let mut simulation = match self.seed {
            Some(seed) => Simulation::with_seed(engine, parameters, viewport, seed)?,
            None => Simulation::new(engine, parameters, viewport)?,
        };

        let burst_every = self.frames.wrapping_div(self.bursts.max(1)).clamp(1, 20);
        let mut bursts_spawned = 0;
        let mut next_burst = 0;
        for frame in 0..self.frames {
            if bursts_spawned < self.bursts && frame == next_burst {
                simulation.queue(gravity_engine::Command::SpawnBurst);
                bursts_spawned += 1;
                next_burst += burst_every;
            }
            simulation.tick();
        }
        tracing::debug!(
            "Snapshot simulated {} frames, {} particles alive",
            self.frames,
            simulation.particle_count()
        );

        let mut canvas = Canvas::new(width, height);
        simulation.render(&mut canvas, 1.0)?;
        Ok(canvas)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn snapshot(path: std::path::PathBuf) -> Snapshot {
        Snapshot {
            path,
            width: 160,
            height: 120,
            frames: 30,
            bursts: 2,
            seed: Some(3),
        }
    }

    #[test]
    fn writes_a_png() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("lens.png");
        snapshot(path.clone())
            .run(
                gravity_engine::config::Config::default(),
                gravity_engine::params::Parameters::default(),
            )
            .unwrap();

        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (160, 120));
        assert_eq!(image.get_pixel(80, 60).0, [0, 0, 0, 255]);
    }

    #[test]
    fn seeded_snapshots_are_reproducible() {
        let settings = snapshot("unused.png".into());
        let first = settings
            .simulate(
                gravity_engine::config::Config::default(),
                gravity_engine::params::Parameters::default(),
            )
            .unwrap();
        let second = settings
            .simulate(
                gravity_engine::config::Config::default(),
                gravity_engine::params::Parameters::default(),
            )
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_sized_snapshots_are_rejected() {
        let mut settings = snapshot("never.png".into());
        settings.width = 0;
        let result = settings.run(
            gravity_engine::config::Config::default(),
            gravity_engine::params::Parameters::default(),
        );
        assert!(result.is_err());
    }
}
