//! Playback engine for xplayer
//!
//! The engine owns the session state machine. It binds one decoder at a
//! time, forwards transport commands to it, turns decoder signals into
//! `PlayerState` transitions and fans every transition out to observers.
//!
//! All state changes happen on the thread that owns the engine. Decoder
//! callbacks and `EngineHandle` commands arrive on a queue and are applied
//! by `dispatch_pending` / `dispatch_timeout`. Each bound decoder gets a new
//! generation number; queued callbacks from an earlier generation are
//! dropped, so a decoder that is still shutting down cannot move the state
//! of the session that replaced it.

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;

use super::handle::{DecoderEvent, EngineCommand, EngineHandle, Inbound};
use super::observer::{ObserverSet, Orientation, PlayerObserver, PlayerScene};
use super::proxy::{EngineProxy, PlayerContext};
use super::surface::{SurfaceHandle, SurfaceSlot};
use super::{NetworkType, PlayerState};
use crate::decoder::{DecoderOptions, DecoderSignal, MediaDecoder, MediaFactory, MediaSource};
use crate::utils::config::EngineConfig;
use crate::utils::error::{PlayerError, Result};

/// Speed multipliers accepted by `set_speed`
const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

struct BoundDecoder {
    decoder: Box<dyn MediaDecoder>,
    generation: u64,
}

/// Per-preparation bookkeeping, cleared whenever a new session starts
#[derive(Debug, Default)]
struct Session {
    /// Decoder reported `Prepared`
    prepared: bool,

    /// `start` was issued to the decoder
    started: bool,

    /// Someone asked to play before the decoder was ready
    start_requested: bool,

    first_frame: bool,

    /// Last buffering percentage that produced a transition
    last_buffer: Option<u8>,

    video_size: Option<(u32, u32)>,

    position_ms: u64,
}

/// Session state machine and decoder host
pub struct PlaybackEngine {
    config: EngineConfig,
    decoder_options: DecoderOptions,
    context: Arc<PlayerContext>,
    factory: Option<Box<dyn MediaFactory>>,

    state: PlayerState,
    bound: Option<BoundDecoder>,
    generation: u64,
    session: Session,
    source: Option<MediaSource>,
    surface: SurfaceSlot,
    observers: ObserverSet,

    inbound_tx: Sender<Inbound>,
    inbound_rx: Receiver<Inbound>,

    network: NetworkType,
    looping: bool,
    volume: f32,
    muted: bool,
    speed: f32,
    scene: PlayerScene,
    orientation: Orientation,
}

impl PlaybackEngine {
    /// Create an engine with default settings and no factory
    pub fn new(context: PlayerContext) -> Self {
        Self::with_parts(EngineConfig::default(), DecoderOptions::default(), context, None)
    }

    pub(crate) fn with_parts(
        config: EngineConfig,
        decoder_options: DecoderOptions,
        context: PlayerContext,
        factory: Option<Box<dyn MediaFactory>>,
    ) -> Self {
        let (inbound_tx, inbound_rx) = unbounded();
        let looping = config.loop_playback;

        Self {
            config,
            decoder_options,
            context: Arc::new(context),
            factory,
            state: PlayerState::Idle,
            bound: None,
            generation: 0,
            session: Session::default(),
            source: None,
            surface: SurfaceSlot::default(),
            observers: ObserverSet::new(),
            inbound_tx,
            inbound_rx,
            network: NetworkType::default(),
            looping,
            volume: 1.0,
            muted: false,
            speed: 1.0,
            scene: PlayerScene::default(),
            orientation: Orientation::default(),
        }
    }

    // ---- decoder binding -------------------------------------------------

    /// Bind a decoder
    ///
    /// Fails with `AlreadyBound` while another decoder is bound; the
    /// rejected decoder is dropped and the current one is left untouched.
    pub fn bind(&mut self, mut decoder: Box<dyn MediaDecoder>) -> Result<()> {
        self.ensure_alive()?;
        if let Some(bound) = &self.bound {
            warn!(
                "Refusing to bind {} decoder: {} decoder (generation {}) is still bound",
                decoder.name(),
                bound.decoder.name(),
                bound.generation
            );
            return Err(PlayerError::AlreadyBound);
        }

        self.generation += 1;
        let generation = self.generation;
        let proxy = Arc::new(EngineProxy::new(
            generation,
            Arc::clone(&self.context),
            self.surface.clone(),
            self.inbound_tx.clone(),
        ));
        proxy.install(decoder.as_mut())?;

        let level = self.output_volume();
        decoder.set_volume(level, level)?;
        decoder.set_speed(self.speed)?;

        if let Some(handle) = self.surface.get() {
            if handle.is_alive() {
                decoder.set_surface(Some(handle))?;
            } else {
                debug!("Dropping dead surface {} on bind", handle.id());
                self.surface.take();
            }
        }

        info!("Bound {} decoder (generation {})", decoder.name(), generation);
        self.bound = Some(BoundDecoder { decoder, generation });
        self.session = Session::default();

        if matches!(
            self.state,
            PlayerState::Reset | PlayerState::Stop | PlayerState::Completion | PlayerState::Error
        ) {
            self.transition(PlayerState::Idle, "decoder bound");
        }

        Ok(())
    }

    /// Build a decoder with the configured factory and bind it
    pub fn bind_new(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| PlayerError::not_ready("no decoder factory configured"))?;
        let decoder = factory.create(&self.context, &self.decoder_options)?;
        self.bind(decoder)
    }

    /// Release the bound decoder, if any
    ///
    /// A session in progress ends in `Stop`.
    pub fn unbind_and_release(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.bound.is_none() {
            return Ok(());
        }

        self.release_decoder();
        if !matches!(
            self.state,
            PlayerState::Idle | PlayerState::Stop | PlayerState::Reset
        ) {
            self.transition(PlayerState::Stop, "decoder released");
        }
        Ok(())
    }

    // ---- surface ---------------------------------------------------------

    pub fn attach_surface(&mut self, surface: SurfaceHandle) -> Result<()> {
        self.ensure_alive()?;
        if !surface.is_alive() {
            return Err(PlayerError::SurfaceLost(surface.id()));
        }

        if let Some(bound) = self.bound.as_mut() {
            bound.decoder.set_surface(Some(surface.clone()))?;
        }
        debug!("Attached surface {}", surface.id());
        self.surface.replace(Some(surface));
        Ok(())
    }

    /// Detach the current surface
    ///
    /// Detaching a surface the host already destroyed is not an error.
    pub fn detach_surface(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let Some(surface) = self.surface.take() else {
            return Ok(());
        };

        if !surface.is_alive() {
            debug!("Surface {} already destroyed by its owner", surface.id());
        }
        if let Some(bound) = self.bound.as_mut() {
            if let Err(e) = bound.decoder.set_surface(None) {
                warn!("Decoder refused to drop surface {}: {}", surface.id(), e);
            }
        }
        Ok(())
    }

    // ---- source and preparation -----------------------------------------

    /// Set the media to play; takes effect on the next `prepare_async`
    pub fn set_source(&mut self, uri: &str) -> Result<()> {
        self.ensure_alive()?;
        let source = MediaSource::parse(uri)?;
        info!("Source set to {}", source);
        self.source = Some(source);
        Ok(())
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    /// Hand the source to the decoder and begin preparing
    ///
    /// Network gating happens here: a disconnected network ends in `Error`,
    /// a cellular network that is not allowed announces `Mobile` and leaves
    /// the session unprepared. Decoder failures become an `Error`
    /// transition rather than an `Err`.
    pub fn prepare_async(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.bound.is_none() {
            return Err(PlayerError::not_ready("no decoder bound"));
        }
        let source = self
            .source
            .clone()
            .ok_or_else(|| PlayerError::invalid_state("no media source set"))?;
        if !self.state.can_prepare() {
            return Err(PlayerError::InvalidState(format!(
                "cannot prepare while {}",
                self.state
            )));
        }

        if source.is_network() {
            match self.network {
                NetworkType::Disconnected => {
                    self.transition(PlayerState::Error, "network unavailable");
                    return Ok(());
                }
                NetworkType::Cellular if !self.config.allow_mobile_network => {
                    self.announce(PlayerState::Mobile, "cellular network, confirm to continue");
                    return Ok(());
                }
                _ => {}
            }
        }

        self.session = Session::default();
        self.transition(PlayerState::Prepare, format!("preparing {}", source.title()));

        let result = match self.bound.as_mut() {
            Some(bound) => bound.decoder.prepare(&source),
            None => Err(PlayerError::not_ready("no decoder bound")),
        };

        match result {
            Ok(()) => Ok(()),
            Err(PlayerError::DecoderFailure(failure)) => {
                warn!("Prepare failed: {}", failure);
                self.transition(PlayerState::Error, failure.message());
                Ok(())
            }
            Err(e) => {
                self.transition(PlayerState::Error, e.to_string());
                Err(e)
            }
        }
    }

    // ---- transport -------------------------------------------------------

    /// Start or restart playback
    ///
    /// While preparing, the start is remembered and issued as soon as the
    /// decoder is ready. After completion, playback restarts from zero.
    pub fn start(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.ensure_bound()?;

        match self.state {
            PlayerState::Idle => Err(PlayerError::not_ready("call prepare_async first")),
            PlayerState::Prepare | PlayerState::Buffer => {
                self.session.start_requested = true;
                if self.session.prepared {
                    self.start_decoder()?;
                }
                Ok(())
            }
            PlayerState::Start | PlayerState::Play | PlayerState::OnPlay => Ok(()),
            PlayerState::Pause | PlayerState::OnPause => self.resume(),
            PlayerState::Completion => {
                // Observers released their session resources on completion
                self.transition(PlayerState::Prepare, "replaying");
                let decoder = self.decoder_mut()?;
                decoder.seek_to(0)?;
                decoder.start()?;
                self.session.started = true;
                self.transition(PlayerState::Play, "restarted");
                Ok(())
            }
            state => Err(PlayerError::InvalidState(format!("cannot start while {}", state))),
        }
    }

    /// Pause on behalf of the user
    pub fn pause(&mut self) -> Result<()> {
        self.ensure_alive()?;
        match self.state {
            state if state.is_playing() => self.suspend(PlayerState::Pause, "paused"),
            PlayerState::OnPause => {
                self.transition(PlayerState::Pause, "paused");
                Ok(())
            }
            PlayerState::Pause => Ok(()),
            PlayerState::Idle => Err(PlayerError::not_ready("nothing is playing")),
            state => Err(PlayerError::InvalidState(format!("cannot pause while {}", state))),
        }
    }

    /// Resume after a user or host pause
    pub fn resume(&mut self) -> Result<()> {
        self.ensure_alive()?;
        match self.state {
            PlayerState::Pause | PlayerState::OnPause => self.unsuspend(PlayerState::Play, "resumed"),
            state if state.is_playing() => Ok(()),
            PlayerState::Idle => Err(PlayerError::not_ready("nothing is playing")),
            state => Err(PlayerError::InvalidState(format!("cannot resume while {}", state))),
        }
    }

    /// Seek within the current session
    ///
    /// Rejected with `NotReady` before the first frame. A playing session
    /// passes through `Buffer` until the decoder reports the seek done.
    pub fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        self.ensure_alive()?;
        match self.state {
            PlayerState::Idle | PlayerState::Prepare => {
                return Err(PlayerError::not_ready("seek before first frame"))
            }
            PlayerState::Buffer if !self.session.first_frame => {
                return Err(PlayerError::not_ready("seek before first frame"))
            }
            PlayerState::Start
            | PlayerState::Play
            | PlayerState::OnPlay
            | PlayerState::Pause
            | PlayerState::OnPause
            | PlayerState::Buffer => {}
            state => {
                return Err(PlayerError::InvalidState(format!("cannot seek while {}", state)))
            }
        }

        self.decoder_mut()?.seek_to(position_ms)?;
        debug!("Seeking to {}", crate::utils::format_millis(position_ms));
        if matches!(
            self.state,
            PlayerState::Start | PlayerState::Play | PlayerState::OnPlay
        ) {
            self.session.last_buffer = None;
            self.transition(PlayerState::Buffer, "seeking");
        }
        Ok(())
    }

    /// Stop playback and release the decoder; the source is kept
    pub fn stop(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.state == PlayerState::Stop {
            return Ok(());
        }
        self.release_decoder();
        self.transition(PlayerState::Stop, "stopped");
        Ok(())
    }

    /// Tear the session down and detach the surface; the source is kept so
    /// a new `bind` can prepare it again
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.release_decoder();
        self.surface.take();
        self.transition(PlayerState::Reset, "reset");
        Ok(())
    }

    /// Release everything; every later call fails with `Destroyed`
    pub fn destroy(&mut self) -> Result<()> {
        self.ensure_alive()?;
        info!("Destroying playback engine {}", self.context.name);
        self.release_decoder();
        self.surface.take();
        self.source = None;
        self.transition(PlayerState::Destroy, "destroyed");
        self.observers.clear();
        // Swapping the receiver out disconnects every handle
        let inbound = std::mem::replace(&mut self.inbound_rx, crossbeam_channel::never());
        let dropped = inbound.try_iter().count();
        if dropped > 0 {
            debug!("Dropped {} queued messages on destroy", dropped);
        }
        Ok(())
    }

    /// Play/pause button semantics
    pub fn toggle_play(&mut self) -> Result<()> {
        self.ensure_alive()?;
        match self.state {
            state if state.is_playing() => self.pause(),
            PlayerState::Pause | PlayerState::OnPause => self.resume(),
            PlayerState::Completion => self.start(),
            state => {
                if state == PlayerState::Error && self.factory.is_some() {
                    self.release_decoder();
                }
                if self.bound.is_none() {
                    self.bind_new()?;
                }
                self.prepare_async()
            }
        }
    }

    /// Confirm playback over cellular
    ///
    /// Allows the mobile network and starts a session that was held back by
    /// the cellular check. A session already playing is left alone.
    pub fn continue_on_mobile(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.set_allow_mobile_network(true);
        if self.state.is_playing() {
            return Ok(());
        }
        self.toggle_play()
    }

    // ---- host lifecycle --------------------------------------------------

    /// The host went to the background
    pub fn on_host_pause(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.state.is_playing() {
            self.suspend(PlayerState::OnPause, "paused by host")
        } else {
            Ok(())
        }
    }

    /// The host came back; only a host pause is undone
    pub fn on_host_resume(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if self.state == PlayerState::OnPause {
            self.unsuspend(PlayerState::OnPlay, "resumed by host")
        } else {
            Ok(())
        }
    }

    /// Report connectivity; entering cellular while playing announces `Mobile`
    pub fn set_network(&mut self, network: NetworkType) -> Result<()> {
        self.ensure_alive()?;
        let previous = std::mem::replace(&mut self.network, network);
        if previous != network {
            debug!("Network changed: {:?} -> {:?}", previous, network);
        }
        if network == NetworkType::Cellular
            && previous != NetworkType::Cellular
            && self.state.is_playing()
        {
            self.announce(PlayerState::Mobile, "playing over cellular network");
        }
        Ok(())
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    pub fn set_allow_mobile_network(&mut self, allow: bool) {
        self.config.allow_mobile_network = allow;
    }

    // ---- playback settings ----------------------------------------------

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Set volume in 0.0..=1.0; values outside are clamped
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.ensure_alive()?;
        self.volume = volume.clamp(0.0, 1.0);
        self.apply_volume()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_mute(&mut self, muted: bool) -> Result<()> {
        self.ensure_alive()?;
        self.muted = muted;
        self.apply_volume()
    }

    /// Flip mute and return the new setting
    pub fn toggle_mute(&mut self) -> Result<bool> {
        let muted = !self.muted;
        self.set_mute(muted)?;
        Ok(muted)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.ensure_alive()?;
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(PlayerError::InvalidInput(format!(
                "Speed must be between {} and {}",
                MIN_SPEED, MAX_SPEED
            )));
        }
        if let Some(bound) = self.bound.as_mut() {
            bound.decoder.set_speed(speed)?;
        }
        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_player_scene(&mut self, scene: PlayerScene) -> Result<()> {
        self.ensure_alive()?;
        self.scene = scene;
        self.observers.notify_scene(scene);
        Ok(())
    }

    pub fn player_scene(&self) -> PlayerScene {
        self.scene
    }

    pub fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        self.ensure_alive()?;
        self.orientation = orientation;
        self.observers.notify_orientation(orientation);
        Ok(())
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    // ---- observers -------------------------------------------------------

    /// Register an observer; registering twice has no effect
    pub fn register_observer(&self, observer: Arc<dyn PlayerObserver>) -> Result<()> {
        self.ensure_alive()?;
        if !self.observers.register(observer) {
            trace!("Observer already registered");
        }
        Ok(())
    }

    /// Unregister an observer; returns whether it was registered
    pub fn unregister_observer(&self, observer: &Arc<dyn PlayerObserver>) -> bool {
        self.observers.unregister(observer)
    }

    /// Shared observer set, usable from inside callbacks
    pub fn observers(&self) -> &ObserverSet {
        &self.observers
    }

    // ---- dispatch --------------------------------------------------------

    /// Apply every message queued before this call
    ///
    /// Returns how many messages were handled.
    pub fn dispatch_pending(&mut self) -> Result<usize> {
        self.ensure_alive()?;
        let pending = self.inbound_rx.len();
        let mut handled = 0;

        for _ in 0..pending {
            let Ok(message) = self.inbound_rx.try_recv() else {
                break;
            };
            self.handle_inbound(message);
            handled += 1;
            if self.state == PlayerState::Destroy {
                break;
            }
        }

        Ok(handled)
    }

    /// Wait up to `timeout` for a message, then apply everything queued
    pub fn dispatch_timeout(&mut self, timeout: Duration) -> Result<usize> {
        self.ensure_alive()?;
        let Ok(message) = self.inbound_rx.recv_timeout(timeout) else {
            return Ok(0);
        };

        self.handle_inbound(message);
        if self.state == PlayerState::Destroy {
            return Ok(1);
        }
        Ok(1 + self.dispatch_pending()?)
    }

    /// Handle for driving this engine from other threads
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.inbound_tx.clone())
    }

    // ---- queries ---------------------------------------------------------

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn is_working(&self) -> bool {
        self.state.is_working()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == PlayerState::Destroy
    }

    pub fn has_decoder(&self) -> bool {
        self.bound.is_some()
    }

    /// Generation of the bound decoder
    pub fn generation(&self) -> Option<u64> {
        self.bound.as_ref().map(|bound| bound.generation)
    }

    /// Media duration in milliseconds; `None` for live or when unknown
    pub fn duration(&self) -> Option<u64> {
        self.bound
            .as_ref()
            .and_then(|bound| bound.decoder.duration().ok().flatten())
    }

    pub fn current_position(&self) -> u64 {
        self.bound
            .as_ref()
            .and_then(|bound| bound.decoder.current_position().ok())
            .unwrap_or(self.session.position_ms)
    }

    pub fn video_size(&self) -> Option<(u32, u32)> {
        self.session.video_size
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface.get()
    }

    pub fn context(&self) -> &PlayerContext {
        &self.context
    }

    // ---- internals -------------------------------------------------------

    fn ensure_alive(&self) -> Result<()> {
        if self.state == PlayerState::Destroy {
            Err(PlayerError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn ensure_bound(&self) -> Result<()> {
        if self.bound.is_none() {
            Err(PlayerError::not_ready("no decoder bound"))
        } else {
            Ok(())
        }
    }

    fn decoder_mut(&mut self) -> Result<&mut Box<dyn MediaDecoder>> {
        self.bound
            .as_mut()
            .map(|bound| &mut bound.decoder)
            .ok_or_else(|| PlayerError::not_ready("no decoder bound"))
    }

    fn output_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    fn apply_volume(&mut self) -> Result<()> {
        let level = self.output_volume();
        if let Some(bound) = self.bound.as_mut() {
            bound.decoder.set_volume(level, level)?;
        }
        Ok(())
    }

    /// Decide a transition and notify observers
    fn transition(&mut self, state: PlayerState, message: impl Into<String>) {
        let message = message.into();
        debug!("{} -> {}: {}", self.state, state, message);
        self.state = state;
        self.observers.notify_state(state, &message);
    }

    /// Notify observers without changing the current state
    fn announce(&self, state: PlayerState, message: &str) {
        debug!("{} (announced while {})", state, self.state);
        self.observers.notify_state(state, message);
    }

    fn start_decoder(&mut self) -> Result<()> {
        if self.session.started {
            return Ok(());
        }
        self.decoder_mut()?.start()?;
        self.session.started = true;
        Ok(())
    }

    fn suspend(&mut self, tag: PlayerState, message: &str) -> Result<()> {
        if self.session.started {
            self.decoder_mut()?.pause()?;
        }
        self.transition(tag, message);
        Ok(())
    }

    fn unsuspend(&mut self, tag: PlayerState, message: &str) -> Result<()> {
        self.session.start_requested = true;

        if !self.session.first_frame {
            if self.session.started {
                self.decoder_mut()?.resume()?;
            } else if self.session.prepared {
                self.start_decoder()?;
            }
            self.transition(PlayerState::Prepare, "resuming preparation");
            return Ok(());
        }

        self.decoder_mut()?.resume()?;
        self.transition(tag, message);
        Ok(())
    }

    /// Stop and release the bound decoder without touching the state
    fn release_decoder(&mut self) {
        if let Some(mut bound) = self.bound.take() {
            info!(
                "Releasing {} decoder (generation {})",
                bound.decoder.name(),
                bound.generation
            );
            if let Err(e) = bound.decoder.stop() {
                debug!("Decoder stop before release failed: {}", e);
            }
            if let Err(e) = bound.decoder.set_surface(None) {
                debug!("Decoder surface unbind before release failed: {}", e);
            }
            bound.decoder.release();
        }
        self.session = Session::default();
    }

    fn handle_inbound(&mut self, message: Inbound) {
        match message {
            Inbound::Decoder { generation, event } => {
                let current = self.bound.as_ref().map(|bound| bound.generation);
                if current == Some(generation) {
                    self.handle_decoder_event(event);
                } else {
                    trace!(
                        "Dropping {:?} from stale decoder generation {} (current {:?})",
                        event,
                        generation,
                        current
                    );
                }
            }
            Inbound::Command(command) => {
                let description = format!("{:?}", command);
                match self.apply_command(command) {
                    Ok(()) => {}
                    Err(e) if e.is_rejection() => debug!("Command {} rejected: {}", description, e),
                    Err(e) => warn!("Command {} failed: {}", description, e),
                }
            }
        }
    }

    fn apply_command(&mut self, command: EngineCommand) -> Result<()> {
        match command {
            EngineCommand::Start => self.start(),
            EngineCommand::Pause => self.pause(),
            EngineCommand::Resume => self.resume(),
            EngineCommand::SeekTo(position_ms) => self.seek_to(position_ms),
            EngineCommand::Stop => self.stop(),
            EngineCommand::Reset => self.reset(),
            EngineCommand::TogglePlay => self.toggle_play(),
            EngineCommand::ContinueOnMobile => self.continue_on_mobile(),
            EngineCommand::HostPause => self.on_host_pause(),
            EngineCommand::HostResume => self.on_host_resume(),
            EngineCommand::SetNetwork(network) => self.set_network(network),
            EngineCommand::SetAllowMobileNetwork(allow) => {
                self.set_allow_mobile_network(allow);
                Ok(())
            }
            EngineCommand::SetPlayerScene(scene) => self.set_player_scene(scene),
            EngineCommand::SetOrientation(orientation) => self.set_orientation(orientation),
            EngineCommand::Destroy => self.destroy(),
        }
    }

    fn handle_decoder_event(&mut self, event: DecoderEvent) {
        match event {
            DecoderEvent::Signal(signal) => self.on_signal(signal),
            DecoderEvent::Buffer(percent) => self.on_buffer(percent),
            DecoderEvent::Progress {
                position_ms,
                duration_ms,
            } => {
                if self.state.is_working() {
                    self.session.position_ms = position_ms;
                    self.observers.notify_progress(position_ms, duration_ms);
                }
            }
            DecoderEvent::VideoSize { width, height } => {
                self.session.video_size = Some((width, height));
                self.observers.notify_video_size(width, height);
            }
        }
    }

    fn on_buffer(&mut self, percent: u8) {
        if !self.state.is_working() {
            return;
        }
        self.observers.notify_buffer(percent);

        if matches!(self.state, PlayerState::Prepare | PlayerState::Buffer)
            && self.session.last_buffer != Some(percent)
        {
            self.session.last_buffer = Some(percent);
            self.transition(PlayerState::Buffer, format!("buffering {}%", percent));
        }
    }

    fn on_signal(&mut self, signal: DecoderSignal) {
        if self.state.is_terminal() {
            debug!("Ignoring {:?} after {}", signal, self.state);
            return;
        }
        if !self.state.is_working() {
            trace!("Ignoring {:?} while {}", signal, self.state);
            return;
        }

        match signal {
            DecoderSignal::Prepared => {
                self.session.prepared = true;
                let wants_start = self.config.auto_play || self.session.start_requested;
                if matches!(self.state, PlayerState::Prepare | PlayerState::Buffer) && wants_start {
                    if let Err(e) = self.start_decoder() {
                        self.fail(e);
                    }
                }
            }
            DecoderSignal::BufferingStart => {
                if matches!(
                    self.state,
                    PlayerState::Prepare | PlayerState::Start | PlayerState::Play | PlayerState::OnPlay
                ) {
                    self.session.last_buffer = None;
                    self.transition(PlayerState::Buffer, "buffering");
                }
            }
            DecoderSignal::BufferingEnd => {
                if self.state == PlayerState::Buffer && self.session.first_frame {
                    self.transition(PlayerState::Play, "buffering finished");
                }
            }
            DecoderSignal::FirstFrame => {
                if self.session.first_frame {
                    return;
                }
                self.session.first_frame = true;
                if matches!(self.state, PlayerState::Prepare | PlayerState::Buffer) {
                    self.transition(PlayerState::Start, "first frame rendered");
                }
            }
            DecoderSignal::SeekComplete => {
                if self.state == PlayerState::Buffer && self.session.first_frame {
                    self.transition(PlayerState::Play, "seek completed");
                }
            }
            DecoderSignal::Completion => self.on_completion(),
            DecoderSignal::Error(failure) => {
                warn!("Decoder error: {}", failure);
                self.transition(PlayerState::Error, failure.message());
            }
        }
    }

    fn on_completion(&mut self) {
        if self.looping {
            info!("Looping back to the beginning");
            let restarted = self
                .decoder_mut()
                .and_then(|decoder| decoder.seek_to(0).and_then(|_| decoder.start()));
            if let Err(e) = restarted {
                self.fail(e);
            }
            return;
        }
        self.transition(PlayerState::Completion, "playback completed");
    }

    fn fail(&mut self, error: PlayerError) {
        warn!("Playback failed: {}", error);
        let message = match &error {
            PlayerError::DecoderFailure(failure) => failure.message(),
            other => other.to_string(),
        };
        self.transition(PlayerState::Error, message);
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.release_decoder();
    }
}
