//! All the CLI arguments for Gravity Lens

/// The name of the config file that's created on first run.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "gravity-lens.toml";

/// A black hole in your terminal. Move the mouse to move it, click to throw particles at it.
#[derive(clap::Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
#[non_exhaustive]
pub(crate) struct CliArgs {
    /// Use a config directory other than the default.
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,

    /// Name of the main config file within the config directory.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE_NAME)]
    pub main_config: std::path::PathBuf,

    /// Override the log level from the config file.
    #[arg(long, value_enum)]
    pub log_level: Option<crate::config::main::LogLevel>,

    /// Override where logs are written.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// Initial mass of the black hole, 1 to 20.
    #[arg(long)]
    pub mass: Option<f32>,

    /// Initial gravitational constant, 0.1 to 3.
    #[arg(long)]
    pub gravity: Option<f32>,

    /// Initial distance between the reference grid's lines, 15 to 80.
    #[arg(long)]
    pub grid_spacing: Option<f32>,

    /// Initial simulation speed, 0 to 3.
    #[arg(long)]
    pub time_scale: Option<f32>,

    /// Initial law of gravity: `paczynski-wiita` or `newtonian`.
    #[arg(long)]
    pub model: Option<gravity_engine::params::ModelKind>,

    /// Don't open the terminal UI, instead simulate for a while and save the final frame as a
    /// PNG.
    #[arg(long)]
    pub snapshot: Option<std::path::PathBuf>,

    /// Width of the snapshot in pixels.
    #[arg(long, default_value_t = 800)]
    pub snapshot_width: u32,

    /// Height of the snapshot in pixels.
    #[arg(long, default_value_t = 600)]
    pub snapshot_height: u32,

    /// How many frames to simulate before saving the snapshot.
    #[arg(long, default_value_t = 240)]
    pub snapshot_frames: u32,

    /// How many bursts of particles to spawn for the snapshot.
    #[arg(long, default_value_t = 3)]
    pub snapshot_bursts: u32,

    /// Seed for the random number generator, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl CliArgs {
    /// Apply any parameter overrides. Values are clamped to their allowed ranges later.
    pub fn override_parameters(&self, parameters: &mut gravity_engine::params::Parameters) {
        if let Some(mass) = self.mass {
            parameters.mass = mass;
        }
        if let Some(gravity) = self.gravity {
            parameters.gravitational_constant = gravity;
        }
        if let Some(grid_spacing) = self.grid_spacing {
            parameters.grid_spacing = grid_spacing;
        }
        if let Some(time_scale) = self.time_scale {
            parameters.time_scale = time_scale;
        }
        if let Some(model) = self.model {
            parameters.model = model;
        }
    }
}
