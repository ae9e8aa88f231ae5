//! Bridge decoder
//!
//! A decoder whose media work happens somewhere else: native bindings, a
//! remote process, or a test. Transport calls are forwarded as
//! `BridgeCommand`s; the driving side reports back through a cloneable
//! `BridgeHandle` from whatever thread it runs on.
//!
//! Release is two-phase. `release()` fails every further call immediately,
//! but listeners stay attached until the driving side calls
//! `BridgeHandle::released()`, so late callbacks can still arrive.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::lifecycle::{DecoderLifecycle, DecoderListeners};
use super::{
    BufferListener, DecoderFailure, DecoderOptions, DecoderSignal, MediaDecoder, MediaSource,
    ProgressListener, SizeListener, StateListener,
};
use crate::player::{PlayerProxy, SurfaceHandle};
use crate::utils::error::Result;

/// Command forwarded to the driving side
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeCommand {
    Prepare(MediaSource),
    Start,
    Pause,
    Resume,
    SeekTo(u64),
    Stop,
    Release,
    /// Surface id, `None` when unbound
    SetSurface(Option<u64>),
    SetVolume(f32, f32),
    SetSpeed(f32),
}

struct BridgeShared {
    lifecycle: Mutex<DecoderLifecycle>,
    listeners: RwLock<DecoderListeners>,
    position_ms: AtomicU64,
    duration_ms: Mutex<Option<u64>>,
    commands: Sender<BridgeCommand>,
}

/// Decoder driven through a [`BridgeHandle`]
pub struct BridgeDecoder {
    shared: Arc<BridgeShared>,
    options: DecoderOptions,
    surface: Option<SurfaceHandle>,
    proxy: Option<Arc<dyn PlayerProxy>>,
}

impl BridgeDecoder {
    /// Create a decoder and the handle that drives it
    pub fn new(options: DecoderOptions) -> (Self, BridgeHandle) {
        let (tx, rx) = unbounded();
        let shared = Arc::new(BridgeShared {
            lifecycle: Mutex::new(DecoderLifecycle::new()),
            listeners: RwLock::new(DecoderListeners::default()),
            position_ms: AtomicU64::new(0),
            duration_ms: Mutex::new(None),
            commands: tx,
        });

        let handle = BridgeHandle {
            shared: Arc::clone(&shared),
            commands: rx,
        };

        let decoder = Self {
            shared,
            options,
            surface: None,
            proxy: None,
        };

        (decoder, handle)
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Surface currently bound
    pub fn surface(&self) -> Option<&SurfaceHandle> {
        self.surface.as_ref()
    }

    /// Engine proxy this decoder was attached to
    pub fn proxy(&self) -> Option<&Arc<dyn PlayerProxy>> {
        self.proxy.as_ref()
    }

    fn forward(&self, command: BridgeCommand) {
        log::trace!("bridge command: {:?}", command);
        // The handle owns the receiver; once it is gone nobody is listening.
        let _ = self.shared.commands.send(command);
    }
}

impl MediaDecoder for BridgeDecoder {
    fn name(&self) -> &'static str {
        "bridge"
    }

    fn prepare(&mut self, source: &MediaSource) -> Result<()> {
        self.shared.lifecycle.lock().begin_prepare()?;
        self.shared.position_ms.store(0, Ordering::SeqCst);
        self.forward(BridgeCommand::Prepare(source.clone()));
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().start()?;
        self.forward(BridgeCommand::Start);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().pause()?;
        self.forward(BridgeCommand::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().resume()?;
        self.forward(BridgeCommand::Resume);
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        self.shared.lifecycle.lock().seek()?;
        self.forward(BridgeCommand::SeekTo(position_ms));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().stop()?;
        self.forward(BridgeCommand::Stop);
        Ok(())
    }

    fn release(&mut self) {
        if !self.shared.lifecycle.lock().release() {
            return;
        }
        self.surface = None;
        self.proxy = None;
        self.forward(BridgeCommand::Release);
    }

    fn duration(&self) -> Result<Option<u64>> {
        self.shared.lifecycle.lock().ensure_alive()?;
        if self.options.live {
            return Ok(None);
        }
        Ok(*self.shared.duration_ms.lock())
    }

    fn current_position(&self) -> Result<u64> {
        self.shared.lifecycle.lock().ensure_alive()?;
        Ok(self.shared.position_ms.load(Ordering::SeqCst))
    }

    fn set_surface(&mut self, surface: Option<SurfaceHandle>) -> Result<()> {
        self.shared.lifecycle.lock().check_surface(surface.as_ref())?;
        self.forward(BridgeCommand::SetSurface(surface.as_ref().map(SurfaceHandle::id)));
        self.surface = surface;
        Ok(())
    }

    fn set_state_listener(&mut self, listener: Option<StateListener>) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.shared.listeners.write().set_state(listener);
        Ok(())
    }

    fn set_progress_listener(&mut self, listener: Option<ProgressListener>) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.shared.listeners.write().set_progress(listener);
        Ok(())
    }

    fn set_buffer_listener(&mut self, listener: Option<BufferListener>) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.shared.listeners.write().set_buffer(listener);
        Ok(())
    }

    fn set_size_listener(&mut self, listener: Option<SizeListener>) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.shared.listeners.write().set_size(listener);
        Ok(())
    }

    fn attach_proxy(&mut self, proxy: Arc<dyn PlayerProxy>) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.proxy = Some(proxy);
        Ok(())
    }

    fn set_volume(&mut self, left: f32, right: f32) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.forward(BridgeCommand::SetVolume(left, right));
        Ok(())
    }

    fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.forward(BridgeCommand::SetSpeed(speed));
        Ok(())
    }
}

impl Drop for BridgeDecoder {
    fn drop(&mut self) {
        self.release();
    }
}

/// Driving side of a [`BridgeDecoder`]
#[derive(Clone)]
pub struct BridgeHandle {
    shared: Arc<BridgeShared>,
    commands: Receiver<BridgeCommand>,
}

impl BridgeHandle {
    /// Report that preparation finished
    ///
    /// Ignored when the decoder was stopped or released meanwhile.
    pub fn prepared(&self) {
        let raised = self.shared.lifecycle.lock().finish_prepare();
        if raised {
            self.signal(DecoderSignal::Prepared);
        } else {
            log::debug!("bridge: prepared after the decoder moved on, ignoring");
        }
    }

    /// Raise a signal as-is
    pub fn signal(&self, signal: DecoderSignal) {
        self.shared.listeners.read().signal(signal);
    }

    pub fn buffering_start(&self) {
        self.signal(DecoderSignal::BufferingStart);
    }

    pub fn buffering_end(&self) {
        self.signal(DecoderSignal::BufferingEnd);
    }

    pub fn first_frame(&self) {
        self.signal(DecoderSignal::FirstFrame);
    }

    pub fn seek_complete(&self) {
        self.signal(DecoderSignal::SeekComplete);
    }

    pub fn completion(&self) {
        self.signal(DecoderSignal::Completion);
    }

    pub fn error(&self, failure: DecoderFailure) {
        self.signal(DecoderSignal::Error(failure));
    }

    pub fn buffer(&self, percent: u8) {
        self.shared.listeners.read().buffer(percent);
    }

    /// Report the playback position; also updates what the decoder answers
    /// for `current_position` and `duration`
    pub fn progress(&self, position_ms: u64, duration_ms: u64) {
        self.shared.position_ms.store(position_ms, Ordering::SeqCst);
        *self.shared.duration_ms.lock() = Some(duration_ms);
        self.shared.listeners.read().progress(position_ms, duration_ms);
    }

    pub fn video_size(&self, width: u32, height: u32) {
        self.shared.listeners.read().size(width, height);
    }

    /// Acknowledge a release; detaches every listener
    pub fn released(&self) {
        self.shared.listeners.write().clear();
    }

    pub fn is_released(&self) -> bool {
        self.shared.lifecycle.lock().is_released()
    }

    /// Commands forwarded so far and not yet taken
    pub fn drain_commands(&self) -> Vec<BridgeCommand> {
        self.commands.try_iter().collect()
    }

    /// Wait for the next forwarded command
    pub fn next_command(&self, timeout: Duration) -> Option<BridgeCommand> {
        self.commands.recv_timeout(timeout).ok()
    }
}
