//! Shared decoder bookkeeping
//!
//! Every backend carries a `DecoderLifecycle` to enforce the call ordering
//! of the decoder contract, and a `DecoderListeners` set to fan its
//! callbacks out to whoever registered them.

use super::{BufferListener, DecoderSignal, ProgressListener, SizeListener, StateListener};
use crate::player::SurfaceHandle;
use crate::utils::error::{PlayerError, Result};

/// Phase of a decoder instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    Idle,
    Preparing,
    Prepared,
    Started,
    Paused,
    Stopped,
    Released,
}

/// Call-order guard for a decoder
#[derive(Debug)]
pub struct DecoderLifecycle {
    phase: DecoderPhase,
}

impl DecoderLifecycle {
    pub fn new() -> Self {
        Self {
            phase: DecoderPhase::Idle,
        }
    }

    pub fn phase(&self) -> DecoderPhase {
        self.phase
    }

    pub fn is_released(&self) -> bool {
        self.phase == DecoderPhase::Released
    }

    /// Fail with `Released` once the decoder has been released
    pub fn ensure_alive(&self) -> Result<()> {
        if self.is_released() {
            Err(PlayerError::Released)
        } else {
            Ok(())
        }
    }

    pub fn begin_prepare(&mut self) -> Result<()> {
        match self.phase {
            DecoderPhase::Released => Err(PlayerError::Released),
            DecoderPhase::Preparing => Err(PlayerError::invalid_state("prepare already in progress")),
            _ => {
                self.phase = DecoderPhase::Preparing;
                Ok(())
            }
        }
    }

    /// Record that asynchronous preparation finished
    ///
    /// Returns false if the decoder moved on meanwhile (stopped or released),
    /// in which case the `Prepared` signal must not be raised.
    pub fn finish_prepare(&mut self) -> bool {
        if self.phase == DecoderPhase::Preparing {
            self.phase = DecoderPhase::Prepared;
            true
        } else {
            false
        }
    }

    pub fn start(&mut self) -> Result<()> {
        match self.phase {
            DecoderPhase::Prepared | DecoderPhase::Started | DecoderPhase::Paused => {
                self.phase = DecoderPhase::Started;
                Ok(())
            }
            phase => Err(self.transport_error(phase, "start")),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.phase {
            DecoderPhase::Started | DecoderPhase::Paused => {
                self.phase = DecoderPhase::Paused;
                Ok(())
            }
            phase => Err(self.transport_error(phase, "pause")),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self.phase {
            DecoderPhase::Started | DecoderPhase::Paused => {
                self.phase = DecoderPhase::Started;
                Ok(())
            }
            phase => Err(self.transport_error(phase, "resume")),
        }
    }

    pub fn seek(&self) -> Result<()> {
        match self.phase {
            DecoderPhase::Prepared | DecoderPhase::Started | DecoderPhase::Paused => Ok(()),
            phase => Err(self.transport_error(phase, "seek")),
        }
    }

    pub fn stop(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.phase = DecoderPhase::Stopped;
        Ok(())
    }

    /// Move to `Released`; returns true only for the first call
    pub fn release(&mut self) -> bool {
        if self.is_released() {
            false
        } else {
            self.phase = DecoderPhase::Released;
            true
        }
    }

    /// Validate a surface before handing it to a backend
    pub fn check_surface(&self, surface: Option<&SurfaceHandle>) -> Result<()> {
        self.ensure_alive()?;
        match surface {
            Some(handle) if !handle.is_alive() => Err(PlayerError::SurfaceLost(handle.id())),
            _ => Ok(()),
        }
    }

    fn transport_error(&self, phase: DecoderPhase, operation: &str) -> PlayerError {
        match phase {
            DecoderPhase::Released => PlayerError::Released,
            phase => PlayerError::InvalidState(format!("cannot {} while {:?}", operation, phase)),
        }
    }
}

impl Default for DecoderLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener set registered on a decoder
#[derive(Default)]
pub struct DecoderListeners {
    state: Option<StateListener>,
    progress: Option<ProgressListener>,
    buffer: Option<BufferListener>,
    size: Option<SizeListener>,
}

impl DecoderListeners {
    pub fn set_state(&mut self, listener: Option<StateListener>) {
        self.state = listener;
    }

    pub fn set_progress(&mut self, listener: Option<ProgressListener>) {
        self.progress = listener;
    }

    pub fn set_buffer(&mut self, listener: Option<BufferListener>) {
        self.buffer = listener;
    }

    pub fn set_size(&mut self, listener: Option<SizeListener>) {
        self.size = listener;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn signal(&self, signal: DecoderSignal) {
        if let Some(listener) = &self.state {
            listener(signal);
        }
    }

    pub fn progress(&self, position_ms: u64, duration_ms: u64) {
        if let Some(listener) = &self.progress {
            listener(position_ms, duration_ms);
        }
    }

    pub fn buffer(&self, percent: u8) {
        if let Some(listener) = &self.buffer {
            listener(percent.min(100));
        }
    }

    pub fn size(&self, width: u32, height: u32) {
        if let Some(listener) = &self.size {
            listener(width, height);
        }
    }
}
