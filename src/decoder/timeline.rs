//! Timeline decoder
//!
//! A self-driven backend that plays a synthetic timeline on a worker
//! thread: it buffers in steps, reports prepared, renders a first frame on
//! start, ticks progress at the configured interval and completes at the
//! end of the timeline. Live sources never complete and report no
//! duration.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::lifecycle::{DecoderLifecycle, DecoderListeners};
use super::{
    BufferListener, DecoderOptions, DecoderSignal, MediaDecoder, MediaSource, ProgressListener,
    SizeListener, StateListener,
};
use crate::player::{PlayerProxy, SurfaceHandle};
use crate::utils::error::{IntoPlayerError, PlayerError, Result};

/// Worker wake-up period
const TICK: Duration = Duration::from_millis(20);

/// Shape of the synthetic media
#[derive(Debug, Clone)]
pub struct TimelineProfile {
    /// Length of the timeline for non-live sources
    pub duration: Duration,

    /// Reported video width
    pub width: u32,

    /// Reported video height
    pub height: u32,

    /// Delay between buffering steps while preparing
    pub prepare_step: Duration,

    /// Percentages reported while preparing
    pub buffer_steps: Vec<u8>,
}

impl Default for TimelineProfile {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
            width: 1280,
            height: 720,
            prepare_step: Duration::from_millis(40),
            buffer_steps: vec![25, 50, 75, 100],
        }
    }
}

#[derive(Debug)]
enum TimelineCommand {
    Prepare,
    Start,
    Pause,
    Resume,
    Seek(u64),
    Stop,
    Speed(f32),
    Shutdown,
}

struct TimelineShared {
    lifecycle: Mutex<DecoderLifecycle>,
    listeners: RwLock<DecoderListeners>,
    position_ms: AtomicU64,
}

/// Self-driven decoder backend
pub struct TimelineDecoder {
    shared: Arc<TimelineShared>,
    profile: TimelineProfile,
    options: DecoderOptions,
    commands: Option<Sender<TimelineCommand>>,
    surface: Option<SurfaceHandle>,
    proxy: Option<Arc<dyn PlayerProxy>>,
    volume: (f32, f32),
    speed: f32,
}

impl TimelineDecoder {
    pub fn new(profile: TimelineProfile, options: DecoderOptions) -> Self {
        Self {
            shared: Arc::new(TimelineShared {
                lifecycle: Mutex::new(DecoderLifecycle::new()),
                listeners: RwLock::new(DecoderListeners::default()),
                position_ms: AtomicU64::new(0),
            }),
            profile,
            options,
            commands: None,
            surface: None,
            proxy: None,
            volume: (1.0, 1.0),
            speed: 1.0,
        }
    }

    pub fn volume(&self) -> (f32, f32) {
        self.volume
    }

    fn duration_ms(&self) -> Option<u64> {
        if self.options.live {
            None
        } else {
            Some(self.profile.duration.as_millis() as u64)
        }
    }

    /// Spawn the worker on first use
    fn worker(&mut self) -> Result<&Sender<TimelineCommand>> {
        if self.commands.is_none() {
            let (tx, rx) = unbounded();
            let shared = Arc::clone(&self.shared);
            let worker = TimelineWorker::new(shared, self.profile.clone(), &self.options, self.speed);

            thread::Builder::new()
                .name("xplayer-timeline".to_string())
                .spawn(move || worker.run(rx))
                .internal_err("Failed to spawn timeline worker")?;

            self.commands = Some(tx);
        }

        self.commands
            .as_ref()
            .ok_or_else(|| crate::internal_error!("timeline worker missing"))
    }

    fn send(&mut self, command: TimelineCommand) -> Result<()> {
        self.worker()?
            .send(command)
            .map_err(|_| PlayerError::Internal("timeline worker exited".to_string()))
    }
}

impl MediaDecoder for TimelineDecoder {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn prepare(&mut self, source: &MediaSource) -> Result<()> {
        self.shared.lifecycle.lock().begin_prepare()?;
        log::debug!("timeline: preparing '{}'", source.title());
        self.shared.position_ms.store(0, Ordering::SeqCst);
        self.send(TimelineCommand::Prepare)
    }

    fn start(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().start()?;
        self.send(TimelineCommand::Start)
    }

    fn pause(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().pause()?;
        self.send(TimelineCommand::Pause)
    }

    fn resume(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().resume()?;
        self.send(TimelineCommand::Resume)
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<()> {
        self.shared.lifecycle.lock().seek()?;
        self.send(TimelineCommand::Seek(position_ms))
    }

    fn stop(&mut self) -> Result<()> {
        self.shared.lifecycle.lock().stop()?;
        if self.commands.is_some() {
            self.send(TimelineCommand::Stop)?;
        }
        Ok(())
    }

    fn release(&mut self) {
        if !self.shared.lifecycle.lock().release() {
            return;
        }

        if let Some(commands) = self.commands.take() {
            let _ = commands.send(TimelineCommand::Shutdown);
        }
        self.shared.listeners.write().clear();
        self.surface = None;
        self.proxy = None;
    }

    fn duration(&self) -> Result<Option<u64>> {
        self.shared.lifecycle.lock().ensure_alive()?;
        Ok(self.duration_ms())
    }

    fn current_position(&self) -> Result<u64> {
        self.shared.lifecycle.lock().ensure_alive()?;
        Ok(self.shared.position_ms.load(Ordering::SeqCst))
    }

    fn set_surface(&mut self, surface: Option<SurfaceHandle>) -> Result<()> {
        self.shared.lifecycle.lock().check_surface(surface.as_ref())?;
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
        log::trace!("timeline: attached to {}", proxy.context().name);
        self.proxy = Some(proxy);
        Ok(())
    }

    fn set_volume(&mut self, left: f32, right: f32) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.volume = (left.clamp(0.0, 1.0), right.clamp(0.0, 1.0));
        Ok(())
    }

    fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.shared.lifecycle.lock().ensure_alive()?;
        self.speed = speed;
        if self.commands.is_some() {
            self.send(TimelineCommand::Speed(speed))?;
        }
        Ok(())
    }
}

impl Drop for TimelineDecoder {
    fn drop(&mut self) {
        self.release();
    }
}

/// State owned by the worker thread
struct TimelineWorker {
    shared: Arc<TimelineShared>,
    profile: TimelineProfile,
    duration_ms: Option<u64>,
    progress_interval: Duration,
    speed: f32,
    playing: bool,
    first_frame: bool,
    position: f64,
    preparing: Option<usize>,
    next_step_at: Instant,
    last_tick: Instant,
    last_progress: Instant,
}

impl TimelineWorker {
    fn new(shared: Arc<TimelineShared>, profile: TimelineProfile, options: &DecoderOptions, speed: f32) -> Self {
        let now = Instant::now();
        let duration_ms = if options.live {
            None
        } else {
            Some(profile.duration.as_millis() as u64)
        };

        Self {
            shared,
            profile,
            duration_ms,
            progress_interval: options.progress_interval,
            speed,
            playing: false,
            first_frame: false,
            position: 0.0,
            preparing: None,
            next_step_at: now,
            last_tick: now,
            last_progress: now,
        }
    }

    fn run(mut self, commands: Receiver<TimelineCommand>) {
        loop {
            match commands.recv_timeout(TICK) {
                Ok(TimelineCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => {
                    self.advance(Instant::now());
                    self.apply(command);
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            self.step_prepare(now);
            self.advance(now);
        }

        log::trace!("timeline worker exiting");
    }

    fn apply(&mut self, command: TimelineCommand) {
        let now = Instant::now();
        match command {
            TimelineCommand::Prepare => {
                self.playing = false;
                self.first_frame = false;
                self.set_position(0.0);
                self.preparing = Some(0);
                self.next_step_at = now + self.profile.prepare_step;
            }
            TimelineCommand::Start => {
                self.playing = true;
                self.last_progress = now;
                if !self.first_frame {
                    self.first_frame = true;
                    self.signal(DecoderSignal::FirstFrame);
                }
            }
            TimelineCommand::Pause => self.playing = false,
            TimelineCommand::Resume => {
                self.playing = true;
                self.last_progress = now;
            }
            TimelineCommand::Seek(target) => {
                let target = match self.duration_ms {
                    Some(duration) => target.min(duration),
                    None => target,
                };
                self.set_position(target as f64);
                self.signal(DecoderSignal::SeekComplete);
            }
            TimelineCommand::Stop => {
                self.playing = false;
                self.preparing = None;
                self.set_position(0.0);
            }
            TimelineCommand::Speed(speed) => self.speed = speed,
            TimelineCommand::Shutdown => {}
        }
    }

    fn step_prepare(&mut self, now: Instant) {
        let Some(step) = self.preparing else {
            return;
        };
        if now < self.next_step_at {
            return;
        }

        if let Some(percent) = self.profile.buffer_steps.get(step) {
            self.shared.listeners.read().buffer(*percent);
        }

        if step + 1 < self.profile.buffer_steps.len() {
            self.preparing = Some(step + 1);
            self.next_step_at = now + self.profile.prepare_step;
            return;
        }

        self.preparing = None;
        let finished = self.shared.lifecycle.lock().finish_prepare();
        if finished {
            self.signal(DecoderSignal::Prepared);
            self.shared
                .listeners
                .read()
                .size(self.profile.width, self.profile.height);
        }
    }

    fn advance(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        if !self.playing {
            return;
        }

        let position = self.position + elapsed.as_secs_f64() * 1000.0 * self.speed as f64;
        if let Some(duration) = self.duration_ms {
            if position >= duration as f64 {
                self.set_position(duration as f64);
                self.playing = false;
                self.shared.listeners.read().progress(duration, duration);
                self.signal(DecoderSignal::Completion);
                return;
            }
        }
        self.set_position(position);

        if now.saturating_duration_since(self.last_progress) >= self.progress_interval {
            self.last_progress = now;
            self.shared
                .listeners
                .read()
                .progress(self.position as u64, self.duration_ms.unwrap_or(0));
        }
    }

    fn set_position(&mut self, position: f64) {
        self.position = position;
        self.shared.position_ms.store(position as u64, Ordering::SeqCst);
    }

    fn signal(&self, signal: DecoderSignal) {
        self.shared.listeners.read().signal(signal);
    }
}
