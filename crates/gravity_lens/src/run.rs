//! Main entrypoint for running Gravity Lens

use std::sync::Arc;

use clap::Parser as _;
use color_eyre::eyre::{ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::cli_args::CliArgs;
use crate::shared_state::SharedState;

/// How many finished frames can wait for the renderer.
const FRAME_BUFFER: usize = 2;

/// Messages broadcast to every task and thread.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub(crate) enum Protocol {
    /// The entire application is exiting.
    End,
    /// User's TTY is resized.
    Resize {
        /// Width of new terminal.
        width: u16,
        /// Height of new terminal.
        height: u16,
    },
    /// Parsed input from STDIN.
    Input(termwiz::input::InputEvent),
}

/// Main entrypoint
pub(crate) async fn run(state_arc: &Arc<SharedState>) -> Result<()> {
    let protocol_tx = state_arc.protocol_tx.clone();
    let cli_args = setup(state_arc).await?;

    if let Some(snapshot) = crate::snapshot::Snapshot::from_cli(&cli_args) {
        let config = state_arc.config.read().await.clone();
        return snapshot.run(config.engine, config.parameters);
    }

    let tty_size = crate::renderer::Renderer::get_users_tty_size()?;
    state_arc
        .set_tty_size(tty_size.cols.try_into()?, tty_size.rows.try_into()?)
        .await;

    let (frames_tx, frames_rx) = tokio::sync::mpsc::channel(FRAME_BUFFER);
    let renderer = crate::renderer::Renderer::start(
        Arc::clone(state_arc),
        frames_rx,
        protocol_tx.clone(),
    );
    let input_thread_handle = crate::input::Input::start(protocol_tx.clone());

    override_on_panic_behaviour();
    let lens = crate::lens::Lens::start(Arc::clone(state_arc), cli_args.seed, frames_tx);

    let lens_result = lens.await;
    broadcast_protocol_end(&protocol_tx);
    lens_result?
        .map_err(|error| color_eyre::eyre::eyre!("Frame loop: {error:?}"))?;
    renderer.await??;
    if input_thread_handle.is_finished() {
        // The STDIN thread blocks on reads so it can't listen for `Protocol::End`. So it's only
        // joined if it finished by itself, probably with an error.
        input_thread_handle
            .join()
            .map_err(|err| color_eyre::eyre::eyre!("STDIN handle: {err:?}"))??;
    }

    tracing::trace!("Leaving Gravity Lens's main `run()` function");
    Ok(())
}

/// The default behaviour prints panics to the terminal, which is in raw mode and showing the
/// simulation. So send them to the log instead.
fn override_on_panic_behaviour() {
    std::panic::set_hook(Box::new(|info| {
        let message = if let Some(message) = info.payload().downcast_ref::<String>() {
            message
        } else if let Some(message) = info.payload().downcast_ref::<&str>() {
            message
        } else {
            "Caught a panic with an unknown type."
        };
        let location = match info.location() {
            Some(location) => format!(
                "{}@{}:{}",
                location.file(),
                location.line(),
                location.column()
            ),
            None => "Unknown location".to_owned(),
        };
        tracing::error!("Caught panic ({}): {message:?}", location);
    }));
}

/// Signal all task/thread loops to exit.
///
/// The error is handled here rather than bubbled, because the `End` message is itself what lets
/// the central error handler be reached.
pub(crate) fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting the protocol `End` message to all listeners");
    let result = protocol_tx.send(Protocol::End);
    if let Err(error) = result {
        tracing::error!("{error:?}");
    }
}

/// Prepare the application to start.
async fn setup(state: &Arc<SharedState>) -> Result<CliArgs> {
    let cli_args = CliArgs::parse();

    let mut main_config_file = state.main_config_file.write().await;
    (*main_config_file).clone_from(&cli_args.main_config);
    drop(main_config_file);

    let directory_result =
        crate::config::main::Config::setup_directory(cli_args.config_dir.clone(), state).await;
    if let Err(directory_error) = directory_result {
        color_eyre::eyre::bail!("Error setting up config directory: {directory_error:?}");
    }

    let config_result = crate::config::main::Config::load_config_into_shared_state(state).await;
    if let Err(config_error) = config_result {
        let path = crate::config::main::Config::main_config_path(state).await;
        color_eyre::eyre::bail!(
            "Bad config file: {config_error:?}\n\nConfig path: {}",
            path.display()
        );
    }

    let mut config = state.config.write().await;
    cli_args.override_parameters(&mut config.parameters);
    config.parameters = config.parameters.clamped();
    drop(config);

    setup_logging(&cli_args, state).await?;

    // Every pixel is a true colour, and termwiz won't send them unless it knows the terminal
    // supports them.
    std::env::set_var("COLORTERM", "truecolor");

    tracing::info!("Starting Gravity Lens");
    tracing::debug!("Loaded config: {:?}", state.config.read().await);

    Ok(cli_args)
}

/// Setup logging
async fn setup_logging(cli_args: &CliArgs, state: &Arc<SharedState>) -> Result<()> {
    let are_log_filters_manually_set = std::env::var("GRAVITY_LENS_LOG").is_ok();
    let mut path = state.config.read().await.log_path.clone();

    if let Some(cli_override_path) = cli_args.log_path.clone() {
        path = cli_override_path;
    }

    let mut level = state.config.read().await.log_level.clone();
    if let Some(cli_override_level) = cli_args.log_level.clone() {
        level = cli_override_level;
    }
    let level_as_string = format!("{level:?}").to_lowercase();

    let is_loggable =
        !matches!(level, crate::config::main::LogLevel::Off) || are_log_filters_manually_set;

    if !is_loggable {
        return Ok(());
    }

    let directory = path.parent().context("Couldn't get log path's parent")?;
    std::fs::create_dir_all(directory)?;
    let file = std::fs::File::create(path)?;

    let filters = if are_log_filters_manually_set {
        if let Ok(user_filters) = std::env::var("GRAVITY_LENS_LOG") {
            std::env::set_var("RUST_LOG", user_filters);
        }

        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .from_env_lossy()
    } else {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .from_env_lossy()
            .add_directive(format!("gravity_lens={level_as_string}").parse()?)
            .add_directive(format!("gravity_engine={level_as_string}").parse()?)
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filters);

    tracing_subscriber::registry().with(logfile_layer).init();

    let mut is_logging = state.is_logging.write().await;
    *is_logging = true;
    drop(is_logging);

    Ok(())
}
