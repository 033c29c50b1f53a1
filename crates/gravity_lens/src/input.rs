//! Read the user's raw keyboard and mouse input.

use std::io::Read as _;

use color_eyre::eyre::Result;

/// How many bytes to read from STDIN at a time.
const READ_BUFFER_SIZE: usize = 128;

/// Listens to STDIN on its own thread.
pub(crate) struct Input {
    /// The main protocol channel.
    protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
}

impl Input {
    /// Start a thread that parses STDIN into keyboard and mouse events and broadcasts them.
    pub fn start(
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> std::thread::JoinHandle<Result<()>> {
        // Reading STDIN blocks, so it gets a real thread rather than a Tokio task.
        std::thread::spawn(move || -> Result<()> {
            let protocol_for_shutdown = protocol_tx.clone();
            let input = Self { protocol_tx };
            if let Err(error) = input.consume_stdin() {
                crate::run::broadcast_protocol_end(&protocol_for_shutdown);
                return Err(error);
            }
            Ok(())
        })
    }

    /// Parse bytes as they arrive. Returns when STDIN closes.
    fn consume_stdin(&self) -> Result<()> {
        tracing::debug!("Starting to listen on STDIN");

        let mut reader = std::io::BufReader::new(std::io::stdin());
        let mut parser = termwiz::input::InputParser::new();
        let mut buffer = [0; READ_BUFFER_SIZE];

        loop {
            let count = reader.read(&mut buffer[..])?;
            if count == 0 {
                tracing::debug!("STDIN closed");
                crate::run::broadcast_protocol_end(&self.protocol_tx);
                return Ok(());
            }

            let Some(bytes) = buffer.get(..count) else {
                tracing::warn!("Couldn't get bytes from STDIN input buffer");
                continue;
            };
            tracing::trace!("Received STDIN input: {bytes:x?}");
            parser.parse(bytes, |event| self.forward(event), count == READ_BUFFER_SIZE);
        }
    }

    /// Send a parsed event to everyone listening.
    fn forward(&self, event: termwiz::input::InputEvent) {
        tracing::trace!("Parsed input event: {event:?}");
        if let Err(error) = self.protocol_tx.send(crate::run::Protocol::Input(event)) {
            tracing::error!("Error sending input event from thread to task: {error:?}");
        }
    }
}
