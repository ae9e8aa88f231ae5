//! Player state vocabulary for xplayer
//!
//! `PlayerState` is the one language the engine, the decoders' host and
//! every overlay widget speak. A `StateChange` pairs a state with the
//! human-readable message the engine attached when it decided the
//! transition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// Decoder bound (or nothing bound yet), nothing prepared
    Idle,

    /// Source handed to the decoder, preparing asynchronously
    Prepare,

    /// Waiting for data
    Buffer,

    /// First frame rendered
    Start,

    /// Playing again after a pause, a buffering stall or a seek
    Play,

    /// Paused by the user
    Pause,

    /// Resumed by the host lifecycle
    OnPlay,

    /// Paused by the host lifecycle
    OnPause,

    /// Playing over a cellular connection (informational)
    Mobile,

    /// End of stream reached
    Completion,

    /// Unrecoverable decoder failure
    Error,

    /// Session torn down, engine reusable
    Reset,

    /// Playback stopped, decoder released, source kept
    Stop,

    /// Engine destroyed
    Destroy,
}

impl PlayerState {
    /// States in which media is (or is about to be) moving
    pub fn is_playing(self) -> bool {
        matches!(
            self,
            PlayerState::Prepare
                | PlayerState::Buffer
                | PlayerState::Start
                | PlayerState::Play
                | PlayerState::OnPlay
        )
    }

    /// States in which a session is in progress, paused or not
    pub fn is_working(self) -> bool {
        self.is_playing() || self.is_paused()
    }

    pub fn is_paused(self) -> bool {
        matches!(self, PlayerState::Pause | PlayerState::OnPause)
    }

    /// States after which no decoder callback may produce a transition
    pub fn is_terminal(self) -> bool {
        matches!(self, PlayerState::Reset | PlayerState::Destroy)
    }

    /// States from which a fresh `prepare_async` is accepted
    pub fn can_prepare(self) -> bool {
        matches!(
            self,
            PlayerState::Idle | PlayerState::Completion | PlayerState::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerState::Idle => "IDLE",
            PlayerState::Prepare => "PREPARE",
            PlayerState::Buffer => "BUFFER",
            PlayerState::Start => "START",
            PlayerState::Play => "PLAY",
            PlayerState::Pause => "PAUSE",
            PlayerState::OnPlay => "ON_PLAY",
            PlayerState::OnPause => "ON_PAUSE",
            PlayerState::Mobile => "MOBILE",
            PlayerState::Completion => "COMPLETION",
            PlayerState::Error => "ERROR",
            PlayerState::Reset => "RESET",
            PlayerState::Stop => "STOP",
            PlayerState::Destroy => "DESTROY",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decided transition: the state plus a descriptive message
///
/// Equality looks at the state tag only, so two changes into `Buffer` with
/// different percentages compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChange {
    pub state: PlayerState,
    pub message: String,
}

impl StateChange {
    pub fn new(state: PlayerState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

impl PartialEq for StateChange {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl Eq for StateChange {}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.state)
        } else {
            write!(f, "{} ({})", self.state, self.message)
        }
    }
}

/// Connectivity reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    #[default]
    Wifi,
    Cellular,
    Disconnected,
}
