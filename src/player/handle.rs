//! Messages into the engine
//!
//! Everything that reaches the engine from another thread travels through
//! one queue: decoder callbacks tagged with the generation of the decoder
//! that produced them, and commands posted through an `EngineHandle`.

use crossbeam_channel::Sender;

use super::{NetworkType, Orientation, PlayerScene};
use crate::decoder::DecoderSignal;
use crate::utils::error::{PlayerError, Result};

/// Callback payload forwarded from a decoder
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderEvent {
    Signal(DecoderSignal),
    Buffer(u8),
    Progress { position_ms: u64, duration_ms: u64 },
    VideoSize { width: u32, height: u32 },
}

/// Operation requested through an `EngineHandle`
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Start,
    Pause,
    Resume,
    SeekTo(u64),
    Stop,
    Reset,
    TogglePlay,
    ContinueOnMobile,
    HostPause,
    HostResume,
    SetNetwork(NetworkType),
    SetAllowMobileNetwork(bool),
    SetPlayerScene(PlayerScene),
    SetOrientation(Orientation),
    Destroy,
}

#[derive(Debug)]
pub(crate) enum Inbound {
    Decoder { generation: u64, event: DecoderEvent },
    Command(EngineCommand),
}

/// Cloneable, thread-safe way to drive an engine
///
/// Commands are queued and applied in order the next time the engine
/// dispatches; rejections are logged rather than returned.
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<Inbound>,
}

impl EngineHandle {
    pub(crate) fn new(tx: Sender<Inbound>) -> Self {
        Self { tx }
    }

    /// Queue a command
    ///
    /// Fails with `Destroyed` once the engine has been destroyed or dropped.
    pub fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(Inbound::Command(command))
            .map_err(|_| PlayerError::Destroyed)
    }

    pub fn start(&self) -> Result<()> {
        self.send(EngineCommand::Start)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(EngineCommand::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(EngineCommand::Resume)
    }

    pub fn seek_to(&self, position_ms: u64) -> Result<()> {
        self.send(EngineCommand::SeekTo(position_ms))
    }

    pub fn stop(&self) -> Result<()> {
        self.send(EngineCommand::Stop)
    }

    pub fn toggle_play(&self) -> Result<()> {
        self.send(EngineCommand::TogglePlay)
    }

    /// Allow cellular playback and continue a session held back by it
    pub fn continue_on_mobile(&self) -> Result<()> {
        self.send(EngineCommand::ContinueOnMobile)
    }

    pub fn host_pause(&self) -> Result<()> {
        self.send(EngineCommand::HostPause)
    }

    pub fn host_resume(&self) -> Result<()> {
        self.send(EngineCommand::HostResume)
    }

    pub fn set_network(&self, network: NetworkType) -> Result<()> {
        self.send(EngineCommand::SetNetwork(network))
    }

    pub fn allow_mobile_network(&self, allow: bool) -> Result<()> {
        self.send(EngineCommand::SetAllowMobileNetwork(allow))
    }

    pub fn destroy(&self) -> Result<()> {
        self.send(EngineCommand::Destroy)
    }
}
