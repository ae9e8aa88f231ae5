//! Engine builder
//!
//! Wires a `PlaybackEngine` together from configuration: engine flags,
//! decoder options and the factory for the configured backend.

use std::sync::Arc;

use super::{PlaybackEngine, PlayerContext, PlayerObserver};
use crate::decoder::{factory_for, MediaFactory};
use crate::utils::config::Config;
use crate::utils::error::Result;

/// Builder for customized engines
pub struct EngineBuilder {
    config: Config,
    context: PlayerContext,
    factory: Option<Box<dyn MediaFactory>>,
    observers: Vec<Arc<dyn PlayerObserver>>,
}

impl EngineBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            context: PlayerContext::new("xplayer"),
            factory: None,
            observers: Vec::new(),
        }
    }

    /// Set configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the host context handed to decoders
    pub fn with_context(mut self, context: PlayerContext) -> Self {
        self.context = context;
        self
    }

    /// Use a specific factory instead of the configured backend's
    pub fn with_factory(mut self, factory: Box<dyn MediaFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Add an observer
    pub fn with_observer(mut self, observer: Arc<dyn PlayerObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PlaybackEngine> {
        self.config.validate()?;

        let factory = self
            .factory
            .unwrap_or_else(|| factory_for(self.config.decoder.backend));
        log::info!(
            "Building engine '{}' with {} backend",
            self.context.name,
            factory.backend()
        );

        let engine = PlaybackEngine::with_parts(
            self.config.engine.clone(),
            self.config.decoder.options(),
            self.context,
            Some(factory),
        );

        for observer in self.observers {
            engine.register_observer(observer)?;
        }

        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine {
    /// Start building an engine
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }
}
