//! All of the user config for Gravity Lens.

use color_eyre::eyre::ContextCompat as _;
use color_eyre::eyre::Result;

/// A copy of the default config file. It gets copied to the user's config folder the first time
/// they start Gravity Lens.
static DEFAULT_CONFIG: &str = include_str!("../../default_config.toml");

/// The valid log levels. Based on our `tracing` crate.
#[derive(serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LogLevel {
    /// Error
    Error,
    /// Warnings
    Warn,
    /// Info
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
    /// No logging
    Off,
}

/// Managing user config.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct Config {
    /// The maximum log level
    pub log_level: LogLevel,
    /// The location of the log file.
    pub log_path: std::path::PathBuf,
    /// Target frame rate
    pub frame_rate: u32,
    /// How many world units fit into a single terminal "pixel". A terminal cell is 1 pixel wide
    /// and 2 pixels high.
    pub pixel_scale: f32,
    /// Whether to show the heads-up display.
    pub show_hud: bool,
    /// The starting values of the live parameters.
    pub parameters: gravity_engine::params::Parameters,
    /// Physics and rendering tunables.
    pub engine: gravity_engine::config::Config,
    /// How much each key press changes things by.
    pub steps: Steps,
    /// Keybindings
    pub keybindings: super::input::KeybindingsRaw,
}

impl Default for Config {
    fn default() -> Self {
        let log_directory = match dirs::state_dir() {
            Some(directory) => directory,
            None => std::path::PathBuf::new().join("./"),
        };
        let log_path = log_directory.join("gravity-lens").join("gravity-lens.log");

        Self {
            log_level: LogLevel::Off,
            log_path,
            frame_rate: 30,
            pixel_scale: 4.0,
            show_hud: true,
            parameters: gravity_engine::params::Parameters::default(),
            engine: gravity_engine::config::Config::default(),
            steps: Steps::default(),
            keybindings: super::input::KeybindingsRaw::new(),
        }
    }
}

/// The increments for keyboard and mouse wheel adjustments.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub(crate) struct Steps {
    /// Mass change per key press.
    pub mass: f32,
    /// Gravitational constant change per key press.
    pub gravitational_constant: f32,
    /// Grid spacing change per key press.
    pub grid_spacing: f32,
    /// Time scale change per key press.
    pub time_scale: f32,
    /// Mass change per notch of the mouse wheel.
    pub wheel_mass: f32,
    /// How far the arrow keys move the attractor, in world units.
    pub nudge: f32,
}

impl Default for Steps {
    fn default() -> Self {
        Self {
            mass: 0.5,
            gravitational_constant: 0.1,
            grid_spacing: 5.0,
            time_scale: 0.1,
            wheel_mass: 1.0,
            nudge: 20.0,
        }
    }
}

impl Config {
    /// Canonical path to the config directory.
    pub async fn directory(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> std::path::PathBuf {
        state.config_path.read().await.clone()
    }

    /// Get the stable location of the config directory on the user's system.
    pub fn default_directory() -> Result<std::path::PathBuf> {
        Ok(dirs::config_dir()
            .context("Couldn't get standard config directory")?
            .join("gravity-lens"))
    }

    /// Figure out where our config is being stored, and create the directory if needed.
    pub async fn setup_directory(
        maybe_custom_path: Option<std::path::PathBuf>,
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> Result<()> {
        let path = match maybe_custom_path {
            None => Self::default_directory()?,
            Some(path_string) => std::path::PathBuf::new().join(path_string),
        };

        std::fs::create_dir_all(path.clone())?;
        *state.config_path.write().await = path;

        Ok(())
    }

    /// Canonical path to the main config file.
    pub async fn main_config_path(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> std::path::PathBuf {
        let directory = Self::directory(state).await;
        let main_config_file = state.main_config_file.read().await.clone();
        directory.join(main_config_file)
    }

    /// Load the main config
    pub async fn load(state: &std::sync::Arc<crate::shared_state::SharedState>) -> Result<Self> {
        let config_path = Self::main_config_path(state).await;
        let config_file_name = config_path
            .file_name()
            .context("Couldn't get file name from config path")?;
        let is_default_config = config_file_name == crate::cli_args::DEFAULT_CONFIG_FILE_NAME;
        if is_default_config && !config_path.exists() {
            tracing::info!("Writing default config to {config_path:?}");
            std::fs::write(config_path.clone(), DEFAULT_CONFIG)?;
        }

        tracing::info!("Loading the main config from: {config_path:?}");
        let result = std::fs::read_to_string(config_path.clone());
        match result {
            Ok(data) => {
                tracing::trace!("Using config file:\n{data}");
                let config = Self::parse(&data)?;
                Self::load_keybindings(state, &config).await?;
                Ok(config)
            }
            Err(err) => {
                tracing::error!("Loading config: {err:?}");
                color_eyre::eyre::bail!(
                    "Couldn't load config at {config_path:?}: {}",
                    err.to_string()
                );
            }
        }
    }

    /// Parse and validate config text.
    fn parse(data: &str) -> Result<Self> {
        let mut config = toml::from_str::<Self>(data)?;
        config.engine.validate()?;
        color_eyre::eyre::ensure!(
            config.pixel_scale.is_finite() && config.pixel_scale > 0.0,
            "`pixel_scale` must be positive, got {}",
            config.pixel_scale
        );
        color_eyre::eyre::ensure!(config.frame_rate > 0, "`frame_rate` must be at least 1");
        config.parameters = config.parameters.clamped();
        Ok(config)
    }

    /// Parse the shipped default config.
    fn parse_default_config() -> Result<Self> {
        Self::parse(DEFAULT_CONFIG)
    }

    /// Load the main config
    pub async fn load_config_into_shared_state(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> Result<Self> {
        let mut config_state = state.config.write().await;
        let new_config = Self::load(state).await?;
        *config_state = new_config.clone();
        drop(config_state);

        Ok(new_config)
    }

    /// Load all keybindings. The user's bindings replace the defaults for the same action.
    #[expect(clippy::iter_over_hash_type, reason = "The ordering doesn't matter")]
    async fn load_keybindings(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
        user_config: &Self,
    ) -> Result<()> {
        let mut keybindings = crate::config::input::KeybindingsAsEvents::new();

        let defaults = Self::parse_default_config()?;
        for (action, binding_config) in defaults.keybindings {
            let key_event: termwiz::input::KeyEvent = binding_config.try_into()?;
            keybindings.insert(action, key_event);
        }

        tracing::trace!("Loading user-defined keybindings...");
        for (action, binding_config) in user_config.keybindings.clone() {
            tracing::trace!("Keybinding found for '{action:?}': {binding_config:?}");
            let key_event: termwiz::input::KeyEvent = binding_config.try_into()?;
            tracing::debug!("Keybinding parsed for '{action:?}': {key_event:?}");
            keybindings.insert(action, key_event);
        }

        *state.keybindings.write().await = keybindings;
        Ok(())
    }
}
