//! The frame loop. It exclusively owns the simulation: input arrives as protocol messages and is
//! queued as engine commands, which the simulation applies at the start of its next tick.

use std::sync::Arc;

use color_eyre::eyre::Result;
use glam::Vec2;
use gravity_engine::canvas::Canvas;
use gravity_engine::Simulation;
use tokio::sync::mpsc;

use crate::controls::{Action, Controls};
use crate::shared_state::{SharedState, TTYSize};
use crate::surface::Surface;

/// Microseconds in a second.
const ONE_SECOND_IN_MICROS: u64 = 1_000_000;

/// The simulation and everything needed to show it in a terminal.
pub(crate) struct Lens {
    /// Shared app state
    state: Arc<SharedState>,
    /// The whole world.
    simulation: Simulation,
    /// Where each frame is drawn before being converted to terminal cells.
    canvas: Canvas,
    /// Maps input events to actions.
    controls: Controls,
    /// The current size of the user's terminal.
    tty_size: TTYSize,
    /// World units per pixel.
    pixel_scale: f32,
    /// The target frame rate.
    frame_rate: u32,
    /// Whether to draw the heads-up display.
    show_hud: bool,
    /// Recent times between frames, for the HUD.
    frame_times: crate::hud::FrameTimes,
    /// When the previous frame was started.
    previous_frame: Option<std::time::Instant>,
    /// When the last sleep between frames ended.
    last_frame_tick: std::time::Instant,
    /// Finished frames go to the renderer through here.
    frames_tx: mpsc::Sender<Surface>,
}

impl Lens {
    /// Build the simulation to fit the user's terminal.
    pub async fn new(
        state: Arc<SharedState>,
        seed: Option<u64>,
        frames_tx: mpsc::Sender<Surface>,
    ) -> Result<Self> {
        let config = state.config.read().await.clone();
        let keybindings = state.keybindings.read().await.clone();
        let tty_size = state.get_tty_size().await;

        let (canvas_width, canvas_height) = canvas_size(tty_size);
        let viewport = viewport(tty_size, config.pixel_scale);
        let simulation = match seed {
            Some(seed) => {
                Simulation::with_seed(config.engine, config.parameters, viewport, seed)?
            }
            None => Simulation::new(config.engine, config.parameters, viewport)?,
        };
        tracing::info!(
            "Simulating a {viewport} world in a {}x{} terminal",
            tty_size.width,
            tty_size.height
        );

        Ok(Self {
            state,
            simulation,
            canvas: Canvas::new(canvas_width, canvas_height),
            controls: Controls::new(keybindings, config.steps, config.pixel_scale),
            tty_size,
            pixel_scale: config.pixel_scale,
            frame_rate: config.frame_rate,
            show_hud: config.show_hud,
            frame_times: crate::hud::FrameTimes::default(),
            previous_frame: None,
            last_frame_tick: std::time::Instant::now(),
            frames_tx,
        })
    }

    /// Run the frame loop in its own task.
    pub fn start(
        state: Arc<SharedState>,
        seed: Option<u64>,
        frames_tx: mpsc::Sender<Surface>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_tx = state.protocol_tx.clone();
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            let result = match Self::new(state, seed, frames_tx).await {
                Ok(mut lens) => lens.run(protocol_rx).await,
                Err(error) => Err(error),
            };

            if let Err(error) = result {
                crate::run::broadcast_protocol_end(&protocol_tx);
                return Err(error);
            }
            Ok(())
        })
    }

    /// Alternate between frames and protocol messages until the app ends.
    async fn run(
        &mut self,
        mut protocol_rx: tokio::sync::broadcast::Receiver<crate::run::Protocol>,
    ) -> Result<()> {
        tracing::debug!("Starting frame loop at {} FPS", self.frame_rate);

        #[expect(
            clippy::integer_division_remainder_used,
            reason = "`tokio::select! generates this.`"
        )]
        loop {
            tokio::select! {
                () = self.sleep_until_next_frame_tick() => {
                    self.frame().await?;
                }
                result = protocol_rx.recv() => {
                    match result {
                        Ok(crate::run::Protocol::End) => break,
                        Ok(message) => self.handle_protocol_message(message),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(count)) => {
                            tracing::warn!("Frame loop missed {count} protocol messages");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }

        tracing::debug!("Exited frame loop after {} frames", self.simulation.frame());
        Ok(())
    }

    /// Sleep until the next frame is due.
    async fn sleep_until_next_frame_tick(&mut self) {
        let target = ONE_SECOND_IN_MICROS.wrapping_div(self.frame_rate.max(1).into());
        let target_frame_duration = std::time::Duration::from_micros(target);
        if let Some(wait) = target_frame_duration.checked_sub(self.last_frame_tick.elapsed()) {
            tokio::time::sleep(wait).await;
        }
        self.last_frame_tick = std::time::Instant::now();
    }

    /// Handle messages from the protocol.
    fn handle_protocol_message(&mut self, message: crate::run::Protocol) {
        match message {
            crate::run::Protocol::Input(event) => {
                for action in self.controls.handle(&event) {
                    self.handle_action(action);
                }
            }
            crate::run::Protocol::Resize { width, height } => self.resize(TTYSize { width, height }),
            crate::run::Protocol::End => (),
        }
    }

    /// Do what the user asked.
    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Engine(command) => {
                self.simulation.queue(command);
            }
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::Quit => {
                tracing::info!("User asked to quit");
                crate::run::broadcast_protocol_end(&self.state.protocol_tx);
            }
        }
    }

    /// Follow the size of the user's terminal.
    fn resize(&mut self, tty_size: TTYSize) {
        self.tty_size = tty_size;
        let (width, height) = canvas_size(tty_size);
        self.canvas.resize(width, height);
        self.simulation.resize(viewport(tty_size, self.pixel_scale));
    }

    /// Advance the world, draw it and send it to the renderer.
    async fn frame(&mut self) -> Result<()> {
        let now = std::time::Instant::now();
        if let Some(previous) = self.previous_frame {
            self.frame_times.record(now.duration_since(previous));
        }
        self.previous_frame = Some(now);

        self.simulation.tick();
        let Some(surface) = self.render()? else {
            return Ok(());
        };
        if self.frames_tx.send(surface).await.is_err() {
            tracing::debug!("Renderer has gone, dropping frame");
        }

        Ok(())
    }

    /// Draw the current frame, or nothing if the terminal has no size.
    fn render(&mut self) -> Result<Option<Surface>> {
        if let Err(error) = self.simulation.render(&mut self.canvas, self.pixel_scale) {
            if error.is_surface_unavailable() {
                tracing::trace!("Skipping frame: {error}");
                return Ok(None);
            }
            return Err(error.into());
        }

        let mut surface = Surface::from_canvas(
            &self.canvas,
            self.tty_size.width.into(),
            self.tty_size.height.into(),
        );

        if self.show_hud {
            let readout = crate::hud::Readout {
                parameters: self.simulation.parameters(),
                particle_count: self.simulation.particle_count(),
                max_particles: self.simulation.config().max_particles,
                is_paused: self.simulation.is_paused(),
                frame_time: self.frame_times.average(),
            };
            crate::hud::draw(&mut surface, &readout)?;
        }

        Ok(Some(surface))
    }
}

/// The canvas has 1 pixel per column and 2 per row.
fn canvas_size(tty_size: TTYSize) -> (usize, usize) {
    (
        usize::from(tty_size.width),
        usize::from(tty_size.height) * 2,
    )
}

/// The size of the world that fits in the terminal.
fn viewport(tty_size: TTYSize, pixel_scale: f32) -> Vec2 {
    let (width, height) = canvas_size(tty_size);
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Terminals are nowhere near big enough to lose precision"
    )]
    let pixels = Vec2::new(width as f32, height as f32);
    pixels * pixel_scale
}
