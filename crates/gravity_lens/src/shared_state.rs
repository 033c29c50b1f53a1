//! The little bit of state that more than one task needs to see. Access is mediated with locks.
//!
//! Note that the simulation itself is not here. It's exclusively owned by the lens task.

use std::sync::Arc;

use tokio::sync::RwLock;

/// The size of the user's terminal
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "A terminal only has 2 dimensions"
)]
pub struct TTYSize {
    /// Width of the TTY
    pub width: u16,
    /// Height of the TTY
    pub height: u16,
}

/// All the shared data the app uses
#[non_exhaustive]
pub(crate) struct SharedState {
    /// The channel on which all protocol messages are sent.
    pub protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    /// Location of the config directory.
    pub config_path: RwLock<std::path::PathBuf>,
    /// Name of the main config file.
    pub main_config_file: RwLock<std::path::PathBuf>,
    /// User config
    pub config: RwLock<crate::config::main::Config>,
    /// All the user-configured keybindings.
    pub keybindings: RwLock<crate::config::input::KeybindingsAsEvents>,
    /// The size of the user's terminal.
    pub tty_size: RwLock<TTYSize>,
    /// Is the application logging?
    pub is_logging: RwLock<bool>,
}

impl SharedState {
    /// Initialise the shared state
    #[must_use]
    pub fn init(
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Arc<Self> {
        let state = Self {
            protocol_tx,
            config_path: RwLock::default(),
            main_config_file: RwLock::default(),
            config: RwLock::default(),
            keybindings: RwLock::default(),
            tty_size: RwLock::default(),
            is_logging: RwLock::default(),
        };
        Arc::new(state)
    }

    /// Get a read lock and return the current TTY size
    pub async fn get_tty_size(&self) -> TTYSize {
        let tty_size = self.tty_size.read().await;
        *tty_size
    }

    /// Get a write lock and set the a new TTY size
    pub async fn set_tty_size(&self, width: u16, height: u16) {
        let mut tty_size = self.tty_size.write().await;
        *tty_size = TTYSize { width, height };
    }
}
