use tauri::State;

use crate::audio::engine::AudioEngineHandle;
use crate::audio::playlist::Playlist;
use crate::audio::state::{AudioState, BindOptions, RepeatMode};

#[tauri::command]
pub fn audio_bind(
    source: String,
    options: Option<BindOptions>,
    engine: State<'_, AudioEngineHandle>,
) -> Result<(), String> {
    engine
        .bind(&source, options.unwrap_or_default())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn audio_play(engine: State<'_, AudioEngineHandle>) {
    engine.play();
}

#[tauri::command]
pub fn audio_pause(engine: State<'_, AudioEngineHandle>) {
    engine.pause();
}

#[tauri::command]
pub fn audio_toggle_play(engine: State<'_, AudioEngineHandle>) {
    engine.toggle_play();
}

#[tauri::command]
pub fn audio_stop(engine: State<'_, AudioEngineHandle>) {
    engine.stop();
}

#[tauri::command]
pub fn audio_set_volume(volume: f32, engine: State<'_, AudioEngineHandle>) {
    engine.set_volume(volume);
}

#[tauri::command]
pub fn audio_set_muted(muted: bool, engine: State<'_, AudioEngineHandle>) {
    engine.set_muted(muted);
}

#[tauri::command]
pub fn audio_toggle_mute(engine: State<'_, AudioEngineHandle>) {
    engine.toggle_mute();
}

#[tauri::command]
pub fn audio_unbind(engine: State<'_, AudioEngineHandle>) {
    engine.unbind();
}

#[tauri::command]
pub fn audio_set_playlist(
    tracks: Vec<String>,
    repeat: Option<RepeatMode>,
    options: Option<BindOptions>,
    engine: State<'_, AudioEngineHandle>,
) -> Result<(), String> {
    if tracks.is_empty() {
        return Err("Playlist is empty".to_string());
    }
    let playlist = Playlist::new(tracks, repeat.unwrap_or_default());
    engine
        .set_playlist(playlist, options.unwrap_or_default())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn audio_next(engine: State<'_, AudioEngineHandle>) {
    engine.next();
}

#[tauri::command]
pub fn audio_previous(engine: State<'_, AudioEngineHandle>) {
    engine.previous();
}

#[tauri::command]
pub fn audio_cycle_repeat(engine: State<'_, AudioEngineHandle>) {
    engine.cycle_repeat();
}

#[tauri::command]
pub fn audio_get_state(engine: State<'_, AudioEngineHandle>) -> AudioState {
    engine.get_state()
}
