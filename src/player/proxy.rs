//! Engine proxy handed to decoders
//!
//! A decoder never holds the engine itself. It gets a `PlayerProxy`, which
//! exposes the host context and the current render surface, and turns the
//! decoder's callbacks into generation-tagged messages on the engine queue.

use crossbeam_channel::Sender;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::handle::{DecoderEvent, EngineHandle, Inbound};
use super::surface::{SurfaceHandle, SurfaceSlot};
use crate::decoder::{DecoderSignal, MediaDecoder};
use crate::utils::error::Result;

/// Host environment a decoder runs in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerContext {
    /// Name used in logs
    pub name: String,

    /// Extra request headers for network sources
    pub headers: BTreeMap<String, String>,

    pub user_agent: Option<String>,
}

impl PlayerContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// What a decoder may see of the engine it is bound to
pub trait PlayerProxy: Send + Sync {
    fn context(&self) -> &PlayerContext;

    /// Surface currently attached to the engine
    fn render_surface(&self) -> Option<SurfaceHandle>;

    /// Handle for posting commands to the engine
    fn engine(&self) -> EngineHandle;

    fn on_player_state(&self, signal: DecoderSignal);

    fn on_buffer(&self, percent: u8);

    fn on_video_size_changed(&self, width: u32, height: u32);

    fn on_progress(&self, position_ms: u64, duration_ms: u64);
}

/// Proxy for one decoder binding
///
/// Every message it posts carries the generation of its binding, so the
/// engine can drop callbacks from a decoder it already let go of.
pub struct EngineProxy {
    generation: u64,
    context: Arc<PlayerContext>,
    surface: SurfaceSlot,
    inbound: Sender<Inbound>,
}

impl EngineProxy {
    pub(crate) fn new(
        generation: u64,
        context: Arc<PlayerContext>,
        surface: SurfaceSlot,
        inbound: Sender<Inbound>,
    ) -> Self {
        Self {
            generation,
            context,
            surface,
            inbound,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn post(&self, event: DecoderEvent) {
        let message = Inbound::Decoder {
            generation: self.generation,
            event,
        };
        if self.inbound.send(message).is_err() {
            log::trace!("engine gone, dropping event from generation {}", self.generation);
        }
    }

    /// Register this proxy's listeners and back-reference on a decoder
    pub(crate) fn install(self: &Arc<Self>, decoder: &mut dyn MediaDecoder) -> Result<()> {
        let proxy = Arc::clone(self);
        decoder.set_state_listener(Some(Box::new(move |signal| proxy.on_player_state(signal))))?;

        let proxy = Arc::clone(self);
        decoder.set_progress_listener(Some(Box::new(move |position, duration| {
            proxy.on_progress(position, duration)
        })))?;

        let proxy = Arc::clone(self);
        decoder.set_buffer_listener(Some(Box::new(move |percent| proxy.on_buffer(percent))))?;

        let proxy = Arc::clone(self);
        decoder.set_size_listener(Some(Box::new(move |width, height| {
            proxy.on_video_size_changed(width, height)
        })))?;

        decoder.attach_proxy(Arc::clone(self) as Arc<dyn PlayerProxy>)
    }
}

impl PlayerProxy for EngineProxy {
    fn context(&self) -> &PlayerContext {
        &self.context
    }

    fn render_surface(&self) -> Option<SurfaceHandle> {
        self.surface.get()
    }

    fn engine(&self) -> EngineHandle {
        EngineHandle::new(self.inbound.clone())
    }

    fn on_player_state(&self, signal: DecoderSignal) {
        self.post(DecoderEvent::Signal(signal));
    }

    fn on_buffer(&self, percent: u8) {
        self.post(DecoderEvent::Buffer(percent));
    }

    fn on_video_size_changed(&self, width: u32, height: u32) {
        self.post(DecoderEvent::VideoSize { width, height });
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        self.post(DecoderEvent::Progress {
            position_ms,
            duration_ms,
        });
    }
}
