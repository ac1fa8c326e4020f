use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default output volume for a freshly bound track.
pub const DEFAULT_VOLUME: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    #[default]
    Unloaded,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Resource unreachable, missing or in an unsupported format
    LoadError,
    /// The platform refused to start playback (autoplay policy)
    PlaybackBlocked,
    Unknown,
}

impl ErrorKind {
    /// Message key for localized display.
    pub fn i18n_key(&self) -> &'static str {
        match self {
            ErrorKind::LoadError => "audio-error-load",
            ErrorKind::PlaybackBlocked => "audio-error-blocked",
            ErrorKind::Unknown => "audio-error-unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PlaybackError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Options accepted by `bind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BindOptions {
    pub volume: f32,
    pub looping: bool,
    /// Decode and queue the whole track before reporting ready.
    pub preload_eager: bool,
    /// Start playback as soon as the track is ready.
    pub autoplay: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            looping: false,
            preload_eager: true,
            autoplay: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    pub fn cycle(&self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

/// Observable snapshot of the playback session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioState {
    pub source: Option<String>,
    pub ready_state: ReadyState,
    pub play_state: PlayState,
    pub volume: f32,
    pub muted: bool,
    pub position_secs: f64,
    pub duration_secs: Option<f64>,
    pub looping: bool,
    /// A play request was issued and has not resolved yet.
    pub starting: bool,
    pub error: Option<PlaybackError>,
}

impl Default for AudioState {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioState {
    pub fn new() -> Self {
        Self {
            source: None,
            ready_state: ReadyState::Unloaded,
            play_state: PlayState::Stopped,
            volume: DEFAULT_VOLUME,
            muted: false,
            position_secs: 0.0,
            duration_secs: None,
            looping: false,
            starting: false,
            error: None,
        }
    }

    /// Level actually sent to the output: zero while muted.
    pub fn output_level(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn is_playing(&self) -> bool {
        self.play_state == PlayState::Playing
    }

    /// Whether the UI should offer transport controls at all. A blocked
    /// start keeps them so a user gesture can retry.
    pub fn controls_enabled(&self) -> bool {
        self.ready_state == ReadyState::Ready
    }
}

pub type SharedState = Arc<RwLock<AudioState>>;

pub fn create_shared_state() -> SharedState {
    Arc::new(RwLock::new(AudioState::new()))
}
