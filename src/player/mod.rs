//! Player module for xplayer
//!
//! This module holds the playback engine and everything that talks to it:
//! the state vocabulary, observer fan-out, the proxy decoders see, the
//! render surface binding and the thread-safe command handle.

mod builder;
mod engine;
mod handle;
mod observer;
mod proxy;
mod state;
mod surface;

pub use builder::EngineBuilder;
pub use engine::PlaybackEngine;
pub use handle::{DecoderEvent, EngineCommand, EngineHandle};
pub use observer::{ObserverSet, Orientation, PlayerObserver, PlayerScene};
pub use proxy::{EngineProxy, PlayerContext, PlayerProxy};
pub use state::{NetworkType, PlayerState, StateChange};
pub use surface::{RenderSurface, SurfaceHandle, SurfaceSlot};
