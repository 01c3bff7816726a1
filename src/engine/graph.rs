//! Shared audio output graph.
//!
//! Both channel players render through a single output stream. The stream is
//! started lazily on the first schedule attempt and starting it again is a
//! no-op, so transport operations can call `ensure_started` freely. A start
//! failure is non-fatal: the caller drops the play request and logs.

use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::error::{EngineError, Result};

pub struct AudioGraph {
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl AudioGraph {
    pub fn new() -> Self {
        Self { stream: None }
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// Start the output stream if it is not already running.
    pub fn ensure_started(&mut self) -> Result<()> {
        if self.stream.is_none() {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| EngineError::GraphStart(e.to_string()))?;
            log::info!("audio output stream started");
            self.stream = Some((stream, handle));
        }
        Ok(())
    }

    /// Create a playback sink on the shared output, starting it first when
    /// needed.
    pub fn new_sink(&mut self) -> Result<Sink> {
        self.ensure_started()?;
        let (_, handle) = self
            .stream
            .as_ref()
            .ok_or_else(|| EngineError::GraphStart("output stream unavailable".into()))?;
        Sink::try_new(handle).map_err(|e| EngineError::GraphStart(e.to_string()))
    }

    /// Tear the output stream down. Any sinks created from it go silent.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            log::info!("audio output stream stopped");
        }
    }
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}
