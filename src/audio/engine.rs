//! Threaded host for the audio control hook.
//!
//! Architecture:
//! - `AudioEngineHandle`: Send + Sync handle that sends commands to the audio thread
//! - `AudioThread`: dedicated thread that owns the media backend and the controller
//! - Media events are posted back onto the same command channel, so they are
//!   applied in order with user commands
//! - SharedState (Arc<RwLock<AudioState>>) for reading state from any thread

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::audio::controller::{AudioController, AudioListener};
use crate::audio::media::{EventDelivery, MediaBackend, MediaEvent};
use crate::audio::playlist::Playlist;
use crate::audio::state::{
    create_shared_state, AudioState, BindOptions, ErrorKind, PlaybackError, ReadyState,
    SharedState,
};
use crate::error::{Error, Result};

/// Interval for position sampling and track-end checks
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Builds the backend on the audio thread. Output streams are usually not
/// Send, so the backend must be created where it is used.
pub type BackendFactory = Box<dyn FnOnce() -> Result<Box<dyn MediaBackend>> + Send>;

/// Commands sent to the audio thread
#[derive(Debug)]
pub enum AudioCommand {
    Bind {
        source: String,
        options: BindOptions,
    },
    Play,
    Pause,
    Stop,
    SetVolume(f32),
    SetMuted(bool),
    Unbind,
    SetPlaylist {
        playlist: Playlist,
        options: BindOptions,
    },
    Next,
    Previous,
    CycleRepeat,
    Media(MediaEvent),
    Shutdown,
}

/// Handle for controlling the audio engine from any thread.
///
/// Dropping the handle unbinds the current track and stops the audio thread.
pub struct AudioEngineHandle {
    cmd_tx: Sender<AudioCommand>,
    state: SharedState,
    thread: Option<JoinHandle<()>>,
}

impl AudioEngineHandle {
    /// Start the engine on the native output device.
    #[cfg(feature = "native-audio")]
    pub fn new(listener: Arc<dyn AudioListener>, sample_interval: Duration) -> Result<Self> {
        Self::with_backend(
            Box::new(|| {
                let backend = crate::audio::rodio_backend::RodioBackend::new()?;
                Ok(Box::new(backend) as Box<dyn MediaBackend>)
            }),
            listener,
            sample_interval,
        )
    }

    /// Start the engine with a custom backend and spawn the audio thread.
    pub fn with_backend(
        factory: BackendFactory,
        listener: Arc<dyn AudioListener>,
        sample_interval: Duration,
    ) -> Result<Self> {
        // Media events are posted from the audio thread itself, so the queue
        // must never block a sender.
        let (cmd_tx, cmd_rx) = unbounded::<AudioCommand>();
        let state = create_shared_state();

        let events_tx = cmd_tx.clone();
        let deliver: EventDelivery = Arc::new(move |event| {
            let _ = events_tx.send(AudioCommand::Media(event));
        });

        let mirror = Arc::new(StateMirror {
            shared: state.clone(),
            inner: listener,
        });

        let thread = thread::Builder::new()
            .name("folio-audio".into())
            .spawn(move || {
                AudioThread::run(factory, cmd_rx, deliver, mirror, sample_interval);
            })
            .map_err(|e| Error::EngineUnavailable(format!("Failed to spawn audio thread: {}", e)))?;

        log::info!("Audio engine initialized");
        Ok(Self {
            cmd_tx,
            state,
            thread: Some(thread),
        })
    }

    /// Bind a new source, replacing the current one.
    pub fn bind(&self, source: &str, options: BindOptions) -> Result<()> {
        log::info!("Binding audio source: {}", source);
        self.cmd_tx
            .send(AudioCommand::Bind {
                source: source.to_string(),
                options,
            })
            .map_err(|e| Error::EngineUnavailable(e.to_string()))
    }

    pub fn play(&self) {
        self.send(AudioCommand::Play);
    }

    pub fn pause(&self) {
        self.send(AudioCommand::Pause);
    }

    pub fn toggle_play(&self) {
        let state = self.state.read();
        if state.is_playing() || state.starting {
            drop(state);
            self.pause();
        } else {
            drop(state);
            self.play();
        }
    }

    pub fn stop(&self) {
        self.send(AudioCommand::Stop);
    }

    pub fn set_volume(&self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume));
    }

    pub fn set_muted(&self, muted: bool) {
        self.send(AudioCommand::SetMuted(muted));
    }

    pub fn toggle_mute(&self) {
        let is_muted = self.state.read().muted;
        self.send(AudioCommand::SetMuted(!is_muted));
    }

    pub fn unbind(&self) {
        self.send(AudioCommand::Unbind);
    }

    /// Install a playlist and bind its first entry.
    pub fn set_playlist(&self, playlist: Playlist, options: BindOptions) -> Result<()> {
        self.cmd_tx
            .send(AudioCommand::SetPlaylist { playlist, options })
            .map_err(|e| Error::EngineUnavailable(e.to_string()))
    }

    pub fn next(&self) {
        self.send(AudioCommand::Next);
    }

    pub fn previous(&self) {
        self.send(AudioCommand::Previous);
    }

    pub fn cycle_repeat(&self) {
        self.send(AudioCommand::CycleRepeat);
    }

    pub fn get_state(&self) -> AudioState {
        self.state.read().clone()
    }

    fn send(&self, cmd: AudioCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            log::warn!("Audio thread not running; command dropped");
        }
    }
}

impl Drop for AudioEngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Audio thread panicked");
            }
        }
    }
}

/// Keeps the shared snapshot current before forwarding notifications.
struct StateMirror {
    shared: SharedState,
    inner: Arc<dyn AudioListener>,
}

impl AudioListener for StateMirror {
    fn state_changed(&self, state: &AudioState) {
        *self.shared.write() = state.clone();
        self.inner.state_changed(state);
    }

    fn ended(&self, source: &str) {
        self.inner.ended(source);
    }
}

/// The audio thread. Owns the backend (through the controller) and applies
/// commands in arrival order.
struct AudioThread {
    controller: AudioController,
    playlist: Option<Playlist>,
    playlist_options: BindOptions,
    sample_interval: Duration,
    last_sample: Instant,
}

impl AudioThread {
    /// Main loop for the audio thread.
    fn run(
        factory: BackendFactory,
        cmd_rx: Receiver<AudioCommand>,
        deliver: EventDelivery,
        mirror: Arc<StateMirror>,
        sample_interval: Duration,
    ) {
        let backend = match factory() {
            Ok(backend) => backend,
            Err(e) => {
                log::error!("Failed to open audio output: {}", e);
                let mut state = AudioState::new();
                state.ready_state = ReadyState::Failed;
                state.error = Some(PlaybackError::new(
                    ErrorKind::LoadError,
                    format!("Audio output unavailable: {}", e),
                ));
                mirror.state_changed(&state);
                return;
            }
        };

        log::info!("Audio thread started");

        let mut thread = Self {
            controller: AudioController::new(backend, deliver, mirror),
            playlist: None,
            playlist_options: BindOptions::default(),
            sample_interval,
            last_sample: Instant::now(),
        };

        // Main loop: process commands with timeout for periodic sampling
        loop {
            match cmd_rx.recv_timeout(thread.sample_interval) {
                Ok(AudioCommand::Shutdown) => {
                    log::info!("Audio thread shutting down");
                    thread.controller.unbind();
                    break;
                }
                Ok(cmd) => thread.handle_command(cmd),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Audio thread shutting down");
                    break;
                }
            }

            // Sample on schedule even under a steady stream of commands
            if thread.last_sample.elapsed() >= thread.sample_interval {
                thread.controller.sample();
                thread.last_sample = Instant::now();
            }
            thread.advance_playlist();
        }
    }

    fn handle_command(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Bind { source, options } => {
                self.playlist = None;
                self.controller.bind(&source, options);
            }
            AudioCommand::Play => self.controller.play(),
            AudioCommand::Pause => self.controller.pause(),
            AudioCommand::Stop => self.controller.stop(),
            AudioCommand::SetVolume(volume) => self.controller.set_volume(volume),
            AudioCommand::SetMuted(muted) => self.controller.set_muted(muted),
            AudioCommand::Unbind => {
                self.playlist = None;
                self.controller.unbind();
            }
            AudioCommand::SetPlaylist { playlist, options } => self.set_playlist(playlist, options),
            AudioCommand::Next => self.skip(true),
            AudioCommand::Previous => self.skip(false),
            AudioCommand::CycleRepeat => {
                if let Some(playlist) = self.playlist.as_mut() {
                    let mode = playlist.cycle_repeat();
                    log::debug!("Repeat mode: {:?}", mode);
                }
            }
            AudioCommand::Media(event) => self.controller.handle_media_event(event),
            AudioCommand::Shutdown => {}
        }
    }

    fn set_playlist(&mut self, playlist: Playlist, options: BindOptions) {
        let Some(first) = playlist.current().map(str::to_string) else {
            log::warn!("Ignoring empty playlist");
            return;
        };
        log::debug!("Installing playlist of {} tracks", playlist.len());
        self.controller.bind(&first, options);
        self.playlist = Some(playlist);
        self.playlist_options = options;
    }

    /// User skip. Keeps playing if something was playing.
    fn skip(&mut self, forward: bool) {
        let Some(playlist) = self.playlist.as_mut() else {
            return;
        };
        let target = if forward {
            playlist.next()
        } else {
            playlist.previous()
        };
        let Some(source) = target.map(str::to_string) else {
            return;
        };

        let state = self.controller.state();
        let options = BindOptions {
            volume: state.volume,
            autoplay: state.is_playing() || state.starting,
            ..self.playlist_options
        };
        self.controller.bind(&source, options);
    }

    fn advance_playlist(&mut self) {
        let Some(ended) = self.controller.take_ended() else {
            return;
        };
        let Some(playlist) = self.playlist.as_mut() else {
            return;
        };

        match playlist.advance().map(str::to_string) {
            Some(source) => {
                log::debug!("{} ended, advancing to {}", ended, source);
                let options = BindOptions {
                    volume: self.controller.state().volume,
                    autoplay: true,
                    ..self.playlist_options
                };
                self.controller.bind(&source, options);
            }
            None => log::debug!("{} ended, playlist finished", ended),
        }
    }
}
