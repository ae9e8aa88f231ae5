//! Decoder module for xplayer
//!
//! This module defines the contract every decoding backend fulfils, the
//! factory that builds backends from a configuration, and two backends:
//! a self-driven timeline decoder and a bridge decoder driven from the
//! outside (native bindings, tests).
//!
//! Decoders report back through listeners registered by the engine. A
//! listener may be invoked from any thread; the engine never assumes it
//! runs on its own thread.

mod bridge;
mod factory;
mod lifecycle;
mod source;
mod timeline;

pub use bridge::{BridgeCommand, BridgeDecoder, BridgeHandle};
pub use factory::{factory_for, Backend, BridgeFactory, MediaFactory, TimelineFactory};
pub use lifecycle::{DecoderLifecycle, DecoderListeners, DecoderPhase};
pub use source::MediaSource;
pub use timeline::{TimelineDecoder, TimelineProfile};

use crate::player::{PlayerProxy, SurfaceHandle};
use crate::utils::error::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Called with every lifecycle signal a decoder raises
pub type StateListener = Box<dyn Fn(DecoderSignal) + Send + Sync>;

/// Called with (position_ms, duration_ms)
pub type ProgressListener = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Called with a buffered percentage in 0..=100
pub type BufferListener = Box<dyn Fn(u8) + Send + Sync>;

/// Called with (width, height) in pixels
pub type SizeListener = Box<dyn Fn(u32, u32) + Send + Sync>;

/// Uniform contract over concrete decoding backends
///
/// Lifecycle: `prepare` is asynchronous and completes with a
/// [`DecoderSignal::Prepared`]; transport operations before that fail with
/// `InvalidState`; `release` is idempotent and every call after it other
/// than another `release` fails with `Released`.
pub trait MediaDecoder: Send {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Begin preparing the given source
    ///
    /// # Arguments
    ///
    /// * `source` - Local file or network location to open
    ///
    /// # Returns
    ///
    /// Returns once preparation has been scheduled; completion is signalled
    /// through the state listener
    fn prepare(&mut self, source: &MediaSource) -> Result<()>;

    /// Start playback of a prepared source
    fn start(&mut self) -> Result<()>;

    /// Pause playback
    fn pause(&mut self) -> Result<()>;

    /// Resume playback after a pause
    fn resume(&mut self) -> Result<()>;

    /// Seek to a position
    ///
    /// # Arguments
    ///
    /// * `position_ms` - Target position in milliseconds
    fn seek_to(&mut self, position_ms: u64) -> Result<()>;

    /// Stop playback; the source must be prepared again before restarting
    fn stop(&mut self) -> Result<()>;

    /// Release all resources. Safe to call any number of times.
    fn release(&mut self);

    /// Total duration in milliseconds, `None` for live or unknown
    fn duration(&self) -> Result<Option<u64>>;

    /// Current playback position in milliseconds
    fn current_position(&self) -> Result<u64>;

    /// Bind or unbind the render surface
    ///
    /// Binding a surface whose owner already destroyed it fails with
    /// `SurfaceLost`.
    fn set_surface(&mut self, surface: Option<SurfaceHandle>) -> Result<()>;

    fn set_state_listener(&mut self, listener: Option<StateListener>) -> Result<()>;

    fn set_progress_listener(&mut self, listener: Option<ProgressListener>) -> Result<()>;

    fn set_buffer_listener(&mut self, listener: Option<BufferListener>) -> Result<()>;

    fn set_size_listener(&mut self, listener: Option<SizeListener>) -> Result<()>;

    /// Give the decoder a back-reference to the engine it is bound to
    fn attach_proxy(&mut self, proxy: Arc<dyn PlayerProxy>) -> Result<()>;

    /// Set per-channel volume in 0.0..=1.0
    fn set_volume(&mut self, left: f32, right: f32) -> Result<()>;

    /// Set playback speed multiplier
    fn set_speed(&mut self, speed: f32) -> Result<()>;
}

/// Lifecycle signal raised by a decoder
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderSignal {
    /// Preparation finished; the decoder accepts transport operations
    Prepared,

    /// Playback stalled waiting for data
    BufferingStart,

    /// Enough data buffered to continue
    BufferingEnd,

    /// First video frame rendered
    FirstFrame,

    /// A seek request finished
    SeekComplete,

    /// End of stream
    Completion,

    /// Unrecoverable failure
    Error(DecoderFailure),
}

/// Category of a decoder failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// I/O, malformed data or timed out reading
    Timeout,

    /// Protocol or codec not supported
    UnsupportedFormat,

    /// Name resolution or connection failed
    Connect,

    /// The location is wrong, forbidden or missing
    InvalidPath,

    /// Decoding failed mid-stream
    DecodeFailed,

    /// Anything the backend could not classify
    Other,
}

impl FailureKind {
    /// User-facing message attached to the `Error` state
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::Timeout => "Playback failed: connection timed out",
            FailureKind::UnsupportedFormat => "Playback failed: unsupported media format",
            FailureKind::Connect => "Playback failed: could not reach the server",
            FailureKind::InvalidPath => "Playback failed: check that the media address is valid",
            FailureKind::DecodeFailed => "Playback failed: decoding error",
            FailureKind::Other => "Playback failed",
        }
    }
}

/// Failure reported by a decoder backend
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderFailure {
    pub kind: FailureKind,

    /// Backend-specific error code
    pub code: i32,

    /// Optional backend detail
    pub detail: Option<String>,
}

impl DecoderFailure {
    pub fn new(kind: FailureKind, code: i32) -> Self {
        Self {
            kind,
            code,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Message used for the `Error` transition
    pub fn message(&self) -> String {
        match self.kind {
            FailureKind::Other => format!("{} (code {})", self.kind.message(), self.code),
            kind => kind.message().to_string(),
        }
    }
}

impl fmt::Display for DecoderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (code {})", self.kind, self.code)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// Option record handed to a factory when building a decoder
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderOptions {
    /// Source is a live stream with no fixed duration
    pub live: bool,

    /// Upper bound of buffered media
    pub buffer_time_max: Duration,

    /// Connect and probe timeout
    pub prepare_timeout: Duration,

    /// Stream read timeout
    pub read_timeout: Duration,

    /// Interval between progress callbacks
    pub progress_interval: Duration,
}

/// Buffering ceiling for live sources
const LIVE_BUFFER_TIME_MAX: Duration = Duration::from_millis(500);

impl DecoderOptions {
    /// Switch to live tuning: keep latency low by buffering less
    pub fn into_live(mut self) -> Self {
        self.live = true;
        self.buffer_time_max = self.buffer_time_max.min(LIVE_BUFFER_TIME_MAX);
        self
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            live: false,
            buffer_time_max: Duration::from_secs(2),
            prepare_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(15),
            progress_interval: Duration::from_secs(1),
        }
    }
}
