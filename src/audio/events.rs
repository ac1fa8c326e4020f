use serde::Serialize;
use tauri::{AppHandle, Emitter, Runtime};

use crate::audio::controller::AudioListener;
use crate::audio::state::AudioState;

pub const STATE_EVENT: &str = "folio://audio-state";
pub const ENDED_EVENT: &str = "folio://audio-ended";

#[derive(Clone, Serialize)]
pub struct TrackEndedEvent {
    pub source: String,
}

/// Forwards engine notifications to every webview of the app.
impl<R: Runtime> AudioListener for AppHandle<R> {
    fn state_changed(&self, state: &AudioState) {
        if let Err(e) = self.emit(STATE_EVENT, state) {
            log::debug!("Failed to emit audio state: {}", e);
        }
    }

    fn ended(&self, source: &str) {
        let event = TrackEndedEvent {
            source: source.to_string(),
        };
        if let Err(e) = self.emit(ENDED_EVENT, event) {
            log::debug!("Failed to emit track end: {}", e);
        }
    }
}
