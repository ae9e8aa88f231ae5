//! Configuration management for xplayer
//!
//! This module handles loading and managing engine configuration
//! from config files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::decoder::{Backend, DecoderOptions};
use crate::utils::error::{IntoPlayerError, PlayerError, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback engine configuration
    pub engine: EngineConfig,

    /// Decoder configuration
    pub decoder: DecoderConfig,

    /// General application settings
    pub general: GeneralConfig,
}

/// Playback engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Start the decoder as soon as it reports prepared
    pub auto_play: bool,

    /// Restart from the beginning instead of completing
    pub loop_playback: bool,

    /// Allow network sources to start while on a cellular connection
    pub allow_mobile_network: bool,
}

/// Decoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Backend family used to build decoders
    pub backend: Backend,

    /// Treat sources as live streams
    pub live: bool,

    /// Upper bound of buffered media in milliseconds
    pub buffer_time_max_ms: u64,

    /// Connect and probe timeout in milliseconds
    pub prepare_timeout_ms: u64,

    /// Stream read timeout in milliseconds
    pub read_timeout_ms: u64,

    /// Interval between progress callbacks in milliseconds
    pub progress_interval_ms: u64,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_play: true,
            loop_playback: false,
            allow_mobile_network: true,
        }
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Timeline,
            live: false,
            buffer_time_max_ms: 2_000,
            prepare_timeout_ms: 10_000,
            read_timeout_ms: 15_000,
            progress_interval_ms: 1_000,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl DecoderConfig {
    /// Build the option record handed to a decoder factory
    pub fn options(&self) -> DecoderOptions {
        let options = DecoderOptions {
            live: false,
            buffer_time_max: Duration::from_millis(self.buffer_time_max_ms),
            prepare_timeout: Duration::from_millis(self.prepare_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            progress_interval: Duration::from_millis(self.progress_interval_ms),
        };

        if self.live {
            options.into_live()
        } else {
            options
        }
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/xplayer/config.toml on Linux)
    /// 3. User config file (~/.config/xplayer/config.toml on Linux)
    /// 4. Environment variables (XPLAYER_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config = Self::read_file(&system_path)?;
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config = Self::read_file(&user_path)?;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from an explicit file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| PlayerError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Save configuration to the given path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    /// Parse a TOML file; missing keys keep their defaults
    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(backend) = std::env::var("XPLAYER_BACKEND") {
            self.decoder.backend = backend.parse()?;
        }

        if let Ok(live) = std::env::var("XPLAYER_LIVE") {
            self.decoder.live = live.parse().config_err("Invalid XPLAYER_LIVE")?;
        }

        if let Ok(looping) = std::env::var("XPLAYER_LOOP") {
            self.engine.loop_playback = looping.parse().config_err("Invalid XPLAYER_LOOP")?;
        }

        if let Ok(interval) = std::env::var("XPLAYER_PROGRESS_INTERVAL_MS") {
            self.decoder.progress_interval_ms = interval
                .parse()
                .config_err("Invalid XPLAYER_PROGRESS_INTERVAL_MS")?;
        }

        if let Ok(log_level) = std::env::var("XPLAYER_LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.decoder.progress_interval_ms == 0 {
            return Err(PlayerError::Config("Progress interval must be non-zero".to_string()));
        }

        if self.decoder.prepare_timeout_ms == 0 || self.decoder.read_timeout_ms == 0 {
            return Err(PlayerError::Config("Decoder timeouts must be non-zero".to_string()));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(PlayerError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level,
                valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/xplayer/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA").ok()
            .map(|p| PathBuf::from(p).join("xplayer").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/xplayer/config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("xplayer").join("config.toml"))
    }
}
