//! Error types for xplayer
//!
//! This module defines the error taxonomy shared by the engine, the decoder
//! contract and the configuration layer. We use thiserror for the library
//! error type and leave anyhow to the binary.

use thiserror::Error;

use crate::decoder::DecoderFailure;

/// Main error type for xplayer
#[derive(Error, Debug)]
pub enum PlayerError {
    /// Operation called out of sequence (e.g. transport before prepare)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A decoder is already bound to the engine
    #[error("A decoder is already bound")]
    AlreadyBound,

    /// Playback has not reached a state where the operation is allowed
    #[error("Not ready: {0}")]
    NotReady(String),

    /// The decoder instance was released
    #[error("Decoder has been released")]
    Released,

    /// The engine was destroyed and cannot be reused
    #[error("Engine has been destroyed")]
    Destroyed,

    /// Unrecoverable failure reported by a decoder backend
    #[error("Decoder failure: {0}")]
    DecoderFailure(DecoderFailure),

    /// The render surface behind a handle is gone
    #[error("Render surface {0} is no longer alive")]
    SurfaceLost(u64),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DecoderFailure> for PlayerError {
    fn from(failure: DecoderFailure) -> Self {
        PlayerError::DecoderFailure(failure)
    }
}

impl PlayerError {
    /// Create an invalid state error from string
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        PlayerError::InvalidState(msg.into())
    }

    /// Create a not ready error from string
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        PlayerError::NotReady(msg.into())
    }

    /// Whether this error is a local rejection of caller misuse, as opposed
    /// to a failure of the decoder or the environment
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PlayerError::InvalidState(_)
                | PlayerError::AlreadyBound
                | PlayerError::NotReady(_)
                | PlayerError::Released
                | PlayerError::Destroyed
        )
    }
}

/// Convenience type alias for Results in xplayer
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Extension trait for converting other errors to PlayerError
pub trait IntoPlayerError<T> {
    /// Convert this error into a PlayerError with the given context
    fn config_err(self, context: &str) -> Result<T>;
    fn input_err(self, context: &str) -> Result<T>;
    fn internal_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoPlayerError<T> for std::result::Result<T, E> {
    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Config(format!("{}: {}", context, e)))
    }

    fn input_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::InvalidInput(format!("{}: {}", context, e)))
    }

    fn internal_err(self, context: &str) -> Result<T> {
        self.map_err(|e| PlayerError::Internal(format!("{}: {}", context, e)))
    }
}

/// Helper macro for creating internal errors with file and line information
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::utils::error::PlayerError::Internal(
            format!("{} at {}:{}", $msg, file!(), line!())
        )
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::utils::error::PlayerError::Internal(
            format!("{} at {}:{}", format!($fmt, $($arg)*), file!(), line!())
        )
    };
}
