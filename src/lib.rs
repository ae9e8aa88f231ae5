//! xplayer - a pluggable video playback engine
//!
//! The engine drives a session state machine over a swappable decoder
//! backend and broadcasts every transition to observers such as overlay
//! widgets.
//!
//! - [`decoder`]: the decoder contract, factories and backends
//! - [`player`]: the playback engine, observers and the decoder proxy
//! - [`widget`]: overlay widgets reacting to playback state
//! - [`utils`]: errors and configuration

pub mod decoder;
pub mod player;
pub mod utils;
pub mod widget;

pub use decoder::{Backend, DecoderFailure, DecoderOptions, DecoderSignal, FailureKind, MediaDecoder, MediaFactory, MediaSource};
pub use player::{
    EngineBuilder, EngineHandle, NetworkType, Orientation, PlaybackEngine, PlayerContext, PlayerObserver,
    PlayerScene, PlayerState, RenderSurface, SurfaceHandle,
};
pub use utils::{Config, PlayerError, Result};
