//! Native core of a personal portfolio site.
//!
//! - [`audio`]: background-music session with a stale-callback-safe control hook
//! - [`viewport`]: breakpoint flags and scroll/visibility triggers
//! - [`prefs`] and [`i18n`]: theme and language context, localized strings
//! - [`contact`]: contact form delivery through a transactional email API
//!
//! With the `tauri` feature, [`init`] bundles everything into a Tauri plugin.

pub mod audio;
pub mod config;
pub mod contact;
pub mod error;
pub mod i18n;
pub mod prefs;
pub mod viewport;

#[cfg(feature = "tauri")]
mod commands;

pub use error::{Error, Result};

#[cfg(feature = "tauri")]
use tauri::{
    plugin::{Builder, TauriPlugin},
    Manager, Runtime,
};

/// Tauri plugin exposing the audio engine, preferences and the contact form.
///
/// Register with `tauri::Builder::default().plugin(folio_lib::init())`.
#[cfg(feature = "tauri")]
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    use std::sync::Arc;

    use audio::{AudioEngineHandle, AudioListener};
    use contact::ContactService;
    use prefs::{JsonFileStore, MemoryStore, PreferenceStore, Preferences, SiteContext};

    Builder::new("folio")
        .setup(|app, _api| {
            let config = config::load();

            if cfg!(debug_assertions) {
                app.plugin(
                    tauri_plugin_log::Builder::default()
                        .level(config.log_level())
                        .build(),
                )?;
            }

            let listener: Arc<dyn AudioListener> = Arc::new(app.clone());
            let engine = AudioEngineHandle::new(listener, config.sample_interval())?;
            if let Some(track) = config.audio.track.as_deref() {
                engine.bind(track, config.bind_options())?;
            }
            app.manage(engine);

            let store: Arc<dyn PreferenceStore> = match JsonFileStore::default_location() {
                Some(store) => Arc::new(store),
                None => {
                    log::warn!("No data directory; preferences will not persist");
                    Arc::new(MemoryStore::default())
                }
            };
            app.manage(SiteContext::load(store, Preferences::default()));

            let contact = ContactService::from_env();
            if let Err(e) = &contact {
                log::warn!("Contact form disabled: {}", e);
            }
            app.manage(commands::ContactState::new(contact));

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            audio::commands::audio_bind,
            audio::commands::audio_play,
            audio::commands::audio_pause,
            audio::commands::audio_toggle_play,
            audio::commands::audio_stop,
            audio::commands::audio_set_volume,
            audio::commands::audio_set_muted,
            audio::commands::audio_toggle_mute,
            audio::commands::audio_unbind,
            audio::commands::audio_set_playlist,
            audio::commands::audio_next,
            audio::commands::audio_previous,
            audio::commands::audio_cycle_repeat,
            audio::commands::audio_get_state,
            commands::prefs_get,
            commands::prefs_toggle_theme,
            commands::prefs_set_language,
            commands::contact_submit,
        ])
        .build()
}
