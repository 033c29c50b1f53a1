//! Own the user's real terminal and draw finished frames to it.

use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::sync::mpsc;

use termwiz::surface::Change as TermwizChange;
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{ScreenSize, Terminal as TermwizTerminal};

use crate::shared_state::SharedState;
use crate::surface::Surface;

/// How often to check for resizes when no frames are arriving, say when the terminal has been
/// shrunk to nothing.
const IDLE_RESIZE_CHECK: std::time::Duration = std::time::Duration::from_millis(250);

/// Draws frames to the user's terminal.
pub(crate) struct Renderer {
    /// Shared app state
    pub state: Arc<SharedState>,
    /// The terminal's width
    pub width: u16,
    /// The terminal's height
    pub height: u16,
}

impl Renderer {
    /// Create a renderer to render to a user's terminal
    pub fn new(state: Arc<SharedState>) -> Result<Self> {
        let size = Self::get_users_tty_size()?;
        Ok(Self {
            state,
            width: size.cols.try_into()?,
            height: size.rows.try_into()?,
        })
    }

    /// Instantiate and run
    pub fn start(
        state: Arc<SharedState>,
        frames_rx: mpsc::Receiver<Surface>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            let result = match Self::new(Arc::clone(&state)) {
                Ok(mut renderer) => renderer.run(frames_rx, protocol_rx, &protocol_tx).await,
                Err(error) => Err(error),
            };

            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_tx);
                return Err(error);
            }
            Ok(())
        })
    }

    /// A concrete terminal, as `BufferedTerminal::new()` won't take a `Box<dyn Terminal>`.
    fn get_termwiz_terminal() -> Result<impl TermwizTerminal> {
        let capabilities = termwiz::caps::Capabilities::new_from_env()?;
        Ok(termwiz::terminal::new_terminal(capabilities)?)
    }

    /// The size of the user's terminal right now.
    pub fn get_users_tty_size() -> Result<ScreenSize> {
        let mut terminal = Self::get_termwiz_terminal()?;
        Ok(terminal.get_screen_size()?)
    }

    /// Get the user's current terminal size and propagate it
    async fn handle_resize<T: TermwizTerminal + Send>(
        &mut self,
        terminal: &mut BufferedTerminal<T>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        let is_resized = terminal.check_for_resize()?;
        if !is_resized {
            return Ok(());
        }

        terminal.repaint()?;

        let (width, height) = terminal.dimensions();
        self.width = width.try_into()?;
        self.height = height.try_into()?;
        tracing::debug!("Terminal resized to {}x{}", self.width, self.height);
        self.state.set_tty_size(self.width, self.height).await;
        protocol_tx.send(crate::run::Protocol::Resize {
            width: self.width,
            height: self.height,
        })?;

        Ok(())
    }

    /// Draw frames as they arrive. It lives in its own method so that whatever happens the
    /// user's terminal is always returned to how it was.
    async fn run(
        &mut self,
        mut frames: mpsc::Receiver<Surface>,
        mut protocol_rx: tokio::sync::broadcast::Receiver<crate::run::Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        tracing::debug!("Putting user's terminal into raw mode");
        let mut users_terminal = Self::get_termwiz_terminal()?;
        users_terminal.set_raw_mode()?;
        users_terminal.enter_alternate_screen()?;
        let mut terminal = BufferedTerminal::new(users_terminal)?;
        terminal.add_change(TermwizChange::CursorVisibility(
            termwiz::surface::CursorVisibility::Hidden,
        ));
        terminal.flush()?;

        let result = self
            .render_loop(&mut frames, &mut protocol_rx, protocol_tx, &mut terminal)
            .await;

        tracing::debug!("Setting user's terminal back to cooked mode");
        terminal.add_change(TermwizChange::CursorVisibility(
            termwiz::surface::CursorVisibility::Visible,
        ));
        terminal.flush()?;
        terminal.terminal().exit_alternate_screen()?;
        terminal.terminal().set_cooked_mode()?;

        result
    }

    /// The loop itself.
    async fn render_loop<T: TermwizTerminal + Send>(
        &mut self,
        frames: &mut mpsc::Receiver<Surface>,
        protocol_rx: &mut tokio::sync::broadcast::Receiver<crate::run::Protocol>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
        terminal: &mut BufferedTerminal<T>,
    ) -> Result<()> {
        tracing::debug!("Starting render loop");
        #[expect(
            clippy::integer_division_remainder_used,
            reason = "`tokio::select! generates this.`"
        )]
        loop {
            tokio::select! {
                Some(frame) = frames.recv() => {
                    self.handle_resize(terminal, protocol_tx).await?;
                    self.render(&frame, terminal)?;
                }
                () = tokio::time::sleep(IDLE_RESIZE_CHECK) => {
                    self.handle_resize(terminal, protocol_tx).await?;
                }
                result = protocol_rx.recv() => {
                    if matches!(
                        result,
                        Ok(crate::run::Protocol::End)
                            | Err(tokio::sync::broadcast::error::RecvError::Closed)
                    ) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Exited render loop");

        Ok(())
    }

    /// Do a single render to the user's actual terminal. `BufferedTerminal` diffs it against
    /// the previous frame so only changed cells are written.
    fn render<T: TermwizTerminal>(
        &self,
        frame: &Surface,
        terminal: &mut BufferedTerminal<T>,
    ) -> Result<()> {
        let is_stale = frame.width != usize::from(self.width)
            || frame.height != usize::from(self.height);
        if is_stale {
            tracing::trace!(
                "Dropping {}x{} frame for {}x{} terminal",
                frame.width,
                frame.height,
                self.width,
                self.height
            );
            return Ok(());
        }

        terminal.draw_from_screen(&frame.surface, 0, 0);
        terminal.flush()?;

        Ok(())
    }
}
