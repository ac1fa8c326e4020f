//! Error types for the folio core.
//!
//! Audio playback failures are not represented here: the control hook
//! captures them as [`crate::audio::state::PlaybackError`] data instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (settings file or environment)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote service answered with a non-success status
    #[error("Server error: {0}")]
    Server(String),

    /// Unsupported or corrupt media
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// No usable audio output device
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// The audio thread is gone
    #[error("Audio thread not responding: {0}")]
    EngineUnavailable(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
