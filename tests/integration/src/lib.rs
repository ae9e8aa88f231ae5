//! Integration test utilities for xplayer
//!
//! This module provides common utilities for integration testing including:
//! - A recording observer
//! - An engine harness driven through bridge decoders
//! - Helpers for waiting on real-time backends

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use xplayer::decoder::{BridgeFactory, BridgeHandle};
use xplayer::player::{
    EngineBuilder, Orientation, PlaybackEngine, PlayerContext, PlayerObserver, PlayerScene,
    PlayerState,
};
use xplayer::utils::Config;

/// Observer that records every notification in arrival order
#[derive(Default)]
pub struct RecordingObserver {
    states: Mutex<Vec<(PlayerState, String)>>,
    buffers: Mutex<Vec<u8>>,
    progress: Mutex<Vec<(u64, u64)>>,
    sizes: Mutex<Vec<(u32, u32)>>,
    scenes: Mutex<Vec<PlayerScene>>,
    orientations: Mutex<Vec<Orientation>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<PlayerState> {
        self.states.lock().iter().map(|(state, _)| *state).collect()
    }

    pub fn messages(&self) -> Vec<(PlayerState, String)> {
        self.states.lock().clone()
    }

    pub fn last_state(&self) -> Option<PlayerState> {
        self.states.lock().last().map(|(state, _)| *state)
    }

    pub fn buffers(&self) -> Vec<u8> {
        self.buffers.lock().clone()
    }

    pub fn progress(&self) -> Vec<(u64, u64)> {
        self.progress.lock().clone()
    }

    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.sizes.lock().clone()
    }

    pub fn scenes(&self) -> Vec<PlayerScene> {
        self.scenes.lock().clone()
    }

    pub fn orientations(&self) -> Vec<Orientation> {
        self.orientations.lock().clone()
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.states.lock().clear();
        self.buffers.lock().clear();
        self.progress.lock().clear();
        self.sizes.lock().clear();
        self.scenes.lock().clear();
        self.orientations.lock().clear();
    }
}

impl PlayerObserver for RecordingObserver {
    fn on_player_state(&self, state: PlayerState, message: &str) {
        self.states.lock().push((state, message.to_string()));
    }

    fn on_buffer(&self, percent: u8) {
        self.buffers.lock().push(percent);
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        self.progress.lock().push((position_ms, duration_ms));
    }

    fn on_video_size_changed(&self, width: u32, height: u32) {
        self.sizes.lock().push((width, height));
    }

    fn on_orientation(&self, orientation: Orientation) {
        self.orientations.lock().push(orientation);
    }

    fn on_player_scene(&self, scene: PlayerScene) {
        self.scenes.lock().push(scene);
    }
}

/// Engine wired to a bridge factory, with a recorder registered
pub struct Harness {
    pub engine: PlaybackEngine,
    pub factory: BridgeFactory,
    pub recorder: Arc<RecordingObserver>,
}

impl Harness {
    /// Harness with default configuration, a bound decoder and a local source
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let factory = BridgeFactory::new();
        let recorder = RecordingObserver::new();
        let mut engine = EngineBuilder::new()
            .with_config(config)
            .with_context(PlayerContext::new("integration").with_user_agent("xplayer-tests"))
            .with_factory(Box::new(factory.clone()))
            .with_observer(recorder.clone())
            .build()?;

        engine.bind_new()?;
        engine.set_source("/media/sample.mp4")?;

        Ok(Self {
            engine,
            factory,
            recorder,
        })
    }

    /// Handle of the decoder bound most recently
    pub fn decoder(&self) -> Result<BridgeHandle> {
        self.factory
            .latest_handle()
            .ok_or_else(|| anyhow!("no bridge decoder created yet"))
    }

    /// Prepare and report the first frame
    pub fn play_to_start(&mut self) -> Result<BridgeHandle> {
        let decoder = self.decoder()?;
        self.engine.prepare_async()?;
        decoder.buffer(100);
        decoder.prepared();
        decoder.video_size(1920, 1080);
        decoder.first_frame();
        self.engine.dispatch_pending()?;

        if self.engine.state() != PlayerState::Start {
            return Err(anyhow!("expected START, engine is {}", self.engine.state()));
        }
        Ok(decoder)
    }
}

/// Dispatch until the engine reaches `state` or the timeout passes
pub fn dispatch_until(engine: &mut PlaybackEngine, state: PlayerState, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if engine.state() == state {
            return Ok(());
        }
        engine.dispatch_timeout(Duration::from_millis(20))?;
    }

    if engine.state() == state {
        Ok(())
    } else {
        Err(anyhow!("timed out waiting for {}, engine is {}", state, engine.state()))
    }
}
