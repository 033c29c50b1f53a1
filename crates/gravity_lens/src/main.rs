//! Just `main()`. Keep as small as possible.

pub mod cli_args;
/// All the user-configurable settings.
pub mod config {
    pub mod input;
    pub mod main;
}
pub mod controls;
pub mod hud;
pub mod input;
pub mod lens;
pub mod renderer;
pub mod run;
pub mod shared_state;
pub mod snapshot;
pub mod surface;

use color_eyre::eyre::Result;

/// Room for a burst of input events before slow listeners start lagging.
const PROTOCOL_CHANNEL_SIZE: usize = 1024;

#[expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "It's our central place for communicating with the user on CLI"
)]
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let (protocol_tx, _) = tokio::sync::broadcast::channel(PROTOCOL_CHANNEL_SIZE);
    let state_arc = shared_state::SharedState::init(protocol_tx);
    let result = run::run(&std::sync::Arc::clone(&state_arc)).await;

    let logpath = state_arc.config.read().await.log_path.clone();
    let is_logging = *state_arc.is_logging.read().await;
    tracing::debug!("Gravity Lens is exiting");

    match result {
        Ok(()) => {
            if is_logging {
                println!("Logs saved to {}", logpath.display());
            }
        }
        Err(error) => {
            tracing::error!("{error:?}");
            eprintln!("Error: {error}");
            if is_logging {
                eprintln!("See {} for more details", logpath.display());
            }
        }
    }

    Ok(())
}
