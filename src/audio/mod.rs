pub mod controller;
pub mod engine;
pub mod media;
pub mod playlist;
pub mod probe;
pub mod source;
pub mod state;

#[cfg(feature = "native-audio")]
pub mod rodio_backend;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(feature = "tauri")]
pub mod commands;
#[cfg(feature = "tauri")]
pub mod events;

pub use controller::{AudioController, AudioListener, NullListener};
pub use engine::AudioEngineHandle;
pub use playlist::Playlist;
pub use state::{AudioState, BindOptions, PlayState, ReadyState, RepeatMode};
