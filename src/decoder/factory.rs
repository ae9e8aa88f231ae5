//! Decoder factories
//!
//! A factory turns a host context plus an option record into a ready,
//! unprepared decoder. The backend family is chosen by configuration.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::{BridgeDecoder, BridgeHandle, DecoderOptions, MediaDecoder, TimelineDecoder, TimelineProfile};
use crate::player::PlayerContext;
use crate::utils::error::{PlayerError, Result};

/// Decoder backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Self-driven timeline decoder
    Timeline,

    /// Decoder driven through a `BridgeHandle`
    Bridge,
}

impl FromStr for Backend {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timeline" => Ok(Backend::Timeline),
            "bridge" => Ok(Backend::Bridge),
            other => Err(PlayerError::Config(format!("Unknown decoder backend '{}'", other))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Timeline => f.write_str("timeline"),
            Backend::Bridge => f.write_str("bridge"),
        }
    }
}

/// Builds decoders for the engine
pub trait MediaFactory: Send + Sync {
    /// Backend family this factory produces
    fn backend(&self) -> Backend;

    /// Create a fresh decoder
    ///
    /// # Arguments
    ///
    /// * `context` - Host context the decoder runs in
    /// * `options` - Buffering, timeout and live tuning
    fn create(&self, context: &PlayerContext, options: &DecoderOptions) -> Result<Box<dyn MediaDecoder>>;
}

/// Factory for `TimelineDecoder`
#[derive(Debug, Clone, Default)]
pub struct TimelineFactory {
    profile: TimelineProfile,
}

impl TimelineFactory {
    pub fn new(profile: TimelineProfile) -> Self {
        Self { profile }
    }
}

impl MediaFactory for TimelineFactory {
    fn backend(&self) -> Backend {
        Backend::Timeline
    }

    fn create(&self, context: &PlayerContext, options: &DecoderOptions) -> Result<Box<dyn MediaDecoder>> {
        log::debug!("Creating timeline decoder for {}", context.name);
        Ok(Box::new(TimelineDecoder::new(self.profile.clone(), options.clone())))
    }
}

/// Factory for `BridgeDecoder`
///
/// Keeps the handle of the most recently created decoder so the driving
/// side can pick it up.
#[derive(Clone, Default)]
pub struct BridgeFactory {
    latest: Arc<Mutex<Option<BridgeHandle>>>,
}

impl BridgeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the last decoder this factory created
    pub fn latest_handle(&self) -> Option<BridgeHandle> {
        self.latest.lock().clone()
    }
}

impl MediaFactory for BridgeFactory {
    fn backend(&self) -> Backend {
        Backend::Bridge
    }

    fn create(&self, context: &PlayerContext, options: &DecoderOptions) -> Result<Box<dyn MediaDecoder>> {
        log::debug!("Creating bridge decoder for {}", context.name);
        let (decoder, handle) = BridgeDecoder::new(options.clone());
        *self.latest.lock() = Some(handle);
        Ok(Box::new(decoder))
    }
}

/// Factory for a configured backend
pub fn factory_for(backend: Backend) -> Box<dyn MediaFactory> {
    match backend {
        Backend::Timeline => Box::new(TimelineFactory::default()),
        Backend::Bridge => Box::new(BridgeFactory::new()),
    }
}
