//! The audio control hook.
//!
//! `AudioController` owns at most one playback session at a time and exposes
//! transport controls over it. It is single-threaded: the engine thread (or a
//! test) drives it with user operations, media events and sampler ticks, and
//! it reports every state change to an `AudioListener`.
//!
//! Nothing here returns errors to the caller. Load and start failures are
//! stored in `AudioState::error` and logged.
//!
//! Two counters guard against late callbacks. Each bind gets a new binding
//! generation, and events tagged with another generation are ignored. Each
//! play request gets a new attempt number, and a resolution for any attempt
//! other than the pending one is ignored, which is how a pause issued before
//! a start resolves wins over that start.

use std::sync::Arc;
use std::time::Duration;

use crate::audio::media::{
    EventDelivery, MediaBackend, MediaElement, MediaEvent, MediaEventKind, MediaEventSink,
    StartFailure,
};
use crate::audio::source::TrackSource;
use crate::audio::state::{AudioState, BindOptions, ErrorKind, PlayState, PlaybackError, ReadyState};

/// Receives state-change notifications from the controller.
pub trait AudioListener: Send + Sync {
    fn state_changed(&self, state: &AudioState);

    /// The bound track reached its end without looping.
    fn ended(&self, _source: &str) {}
}

/// Listener that ignores everything.
pub struct NullListener;

impl AudioListener for NullListener {
    fn state_changed(&self, _state: &AudioState) {}
}

struct Session {
    binding: u64,
    source: TrackSource,
    options: BindOptions,
    element: Box<dyn MediaElement>,
    pending_start: Option<u64>,
    next_attempt: u64,
    /// Reached its end since the last start; the next play rewinds first.
    reached_end: bool,
    sampling: bool,
}

impl Session {
    fn begin_start(&mut self) -> u64 {
        self.next_attempt += 1;
        let attempt = self.next_attempt;
        self.pending_start = Some(attempt);
        self.element.start(attempt);
        attempt
    }
}

pub struct AudioController {
    backend: Box<dyn MediaBackend>,
    deliver: EventDelivery,
    listener: Arc<dyn AudioListener>,
    session: Option<Session>,
    next_binding: u64,
    state: AudioState,
    ended: Option<String>,
}

impl AudioController {
    /// `deliver` is where elements post their events; whoever owns the
    /// controller must feed them back through `handle_media_event`.
    pub fn new(
        backend: Box<dyn MediaBackend>,
        deliver: EventDelivery,
        listener: Arc<dyn AudioListener>,
    ) -> Self {
        Self {
            backend,
            deliver,
            listener,
            session: None,
            next_binding: 0,
            state: AudioState::new(),
            ended: None,
        }
    }

    pub fn state(&self) -> &AudioState {
        &self.state
    }

    /// Generation of the current session, if one is bound.
    pub fn binding(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.binding)
    }

    /// Source of the last track that ended naturally, cleared on read.
    pub fn take_ended(&mut self) -> Option<String> {
        self.ended.take()
    }

    /// Bind `source`, replacing any current session.
    pub fn bind(&mut self, source: &str, options: BindOptions) {
        if self.session.is_some() {
            log::debug!("Rebinding: tearing down previous session");
            self.release_session();
        }

        self.next_binding += 1;
        let binding = self.next_binding;

        let muted = self.state.muted;
        self.state = AudioState {
            source: Some(source.to_string()),
            volume: clamp_volume(options.volume).unwrap_or(self.state.volume),
            muted,
            looping: options.looping,
            ..AudioState::new()
        };

        let parsed = TrackSource::parse(source);
        let opened = parsed.and_then(|track| {
            let sink = MediaEventSink::new(binding, self.deliver.clone());
            let element = self.backend.open(&track, &options, sink)?;
            Ok((track, element))
        });

        match opened {
            Ok((track, mut element)) => {
                element.set_output_level(self.state.output_level());
                log::info!("Bound audio source: {}", track);
                self.session = Some(Session {
                    binding,
                    source: track,
                    options,
                    element,
                    pending_start: None,
                    next_attempt: 0,
                    reached_end: false,
                    sampling: false,
                });
                self.state.ready_state = ReadyState::Loading;
            }
            Err(e) => {
                log::info!("Failed to bind audio source {}: {}", source, e);
                self.state.ready_state = ReadyState::Failed;
                self.state.error = Some(PlaybackError::new(ErrorKind::LoadError, e.to_string()));
            }
        }
        self.notify();
    }

    pub fn play(&mut self) {
        let Some(session) = self.session.as_mut() else {
            log::warn!("play() ignored: no source bound");
            return;
        };
        if self.state.ready_state != ReadyState::Ready {
            log::warn!("play() ignored: source not ready ({:?})", self.state.ready_state);
            return;
        }
        if self.state.play_state == PlayState::Playing || session.pending_start.is_some() {
            return;
        }

        if session.reached_end {
            session.element.rewind();
            session.reached_end = false;
            self.state.position_secs = 0.0;
        }

        let attempt = session.begin_start();
        log::debug!("Play requested (attempt {})", attempt);
        self.state.starting = true;
        self.notify();
    }

    pub fn pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(attempt) = session.pending_start.take() {
            // The start may still succeed later; its resolution is now stale.
            session.element.pause();
            self.state.starting = false;
            log::debug!("Pause cancelled pending start (attempt {})", attempt);
            if self.state.play_state == PlayState::Playing {
                session.sampling = false;
                self.state.play_state = PlayState::Paused;
            }
            self.notify();
            return;
        }

        if self.state.play_state != PlayState::Playing {
            return;
        }

        session.element.pause();
        session.sampling = false;
        let position = session.element.current_time();
        self.state.position_secs = clamp_position(position, self.state.duration_secs);
        self.state.play_state = PlayState::Paused;
        log::debug!("Paused at {:.1}s", self.state.position_secs);
        self.notify();
    }

    /// Pause and rewind, whatever the current state.
    pub fn stop(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        session.element.pause();
        session.element.rewind();
        session.pending_start = None;
        session.sampling = false;
        session.reached_end = false;

        self.state.starting = false;
        self.state.position_secs = 0.0;
        self.state.play_state = PlayState::Stopped;
        log::debug!("Stopped");
        self.notify();
    }

    pub fn set_volume(&mut self, volume: f32) {
        let Some(volume) = clamp_volume(volume) else {
            log::warn!("set_volume() ignored: volume is NaN");
            return;
        };

        self.state.volume = volume;
        if !self.state.muted {
            if let Some(session) = self.session.as_mut() {
                session.element.set_output_level(volume);
            }
        }
        self.notify();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.state.muted = muted;
        let level = self.state.output_level();
        if let Some(session) = self.session.as_mut() {
            session.element.set_output_level(level);
        }
        self.notify();
    }

    /// Release the session. Callbacks still in flight for it become no-ops.
    pub fn unbind(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.release_session();

        let (volume, muted) = (self.state.volume, self.state.muted);
        self.state = AudioState {
            volume,
            muted,
            ..AudioState::new()
        };
        log::info!("Audio source unbound");
        self.notify();
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        let Some(session) = self.session.as_mut() else {
            log::debug!("Dropping media event with no session: {:?}", event.kind);
            return;
        };
        if session.binding != event.binding {
            log::debug!(
                "Dropping stale media event from binding {} (current {})",
                event.binding,
                session.binding
            );
            return;
        }

        match event.kind {
            MediaEventKind::Loaded { duration } => self.on_loaded(duration),
            MediaEventKind::LoadFailed { message } => self.on_load_failed(message),
            MediaEventKind::PlayResolved { attempt, outcome } => {
                self.on_play_resolved(attempt, outcome)
            }
            MediaEventKind::Ended => self.on_ended(),
        }
    }

    /// Position sampler tick. Does nothing unless playback is running.
    pub fn sample(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.sampling {
            return;
        }
        if session.element.has_ended() {
            self.on_ended();
            return;
        }

        let position = clamp_position(session.element.current_time(), self.state.duration_secs);
        if position != self.state.position_secs {
            self.state.position_secs = position;
            self.notify();
        }
    }

    fn on_loaded(&mut self, duration: Option<Duration>) {
        if self.state.ready_state != ReadyState::Loading {
            return;
        }
        self.state.ready_state = ReadyState::Ready;
        self.state.duration_secs = duration.map(|d| d.as_secs_f64());
        log::info!("Audio ready (duration {:?})", duration);
        self.notify();

        let autoplay = self
            .session
            .as_ref()
            .map(|s| s.options.autoplay)
            .unwrap_or(false);
        if autoplay {
            self.play();
        }
    }

    fn on_load_failed(&mut self, message: String) {
        if self.state.ready_state != ReadyState::Loading {
            return;
        }
        log::info!("Audio failed to load: {}", message);
        self.state.ready_state = ReadyState::Failed;
        self.state.error = Some(PlaybackError::new(ErrorKind::LoadError, message));
        self.notify();
    }

    fn on_play_resolved(&mut self, attempt: u64, outcome: Result<(), StartFailure>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.pending_start != Some(attempt) {
            log::debug!("Ignoring stale play resolution (attempt {})", attempt);
            if outcome.is_ok()
                && session.pending_start.is_none()
                && self.state.play_state != PlayState::Playing
            {
                // The player started after we stopped wanting it to. A newer
                // pending start owns the element, so leave it running.
                session.element.pause();
            }
            return;
        }
        session.pending_start = None;
        self.state.starting = false;

        match outcome {
            Ok(()) => {
                session.sampling = true;
                self.state.play_state = PlayState::Playing;
                self.state.error = None;
                log::debug!("Playback started (attempt {})", attempt);
            }
            Err(failure) => {
                log::warn!("Playback could not start: {}", failure.message());
                session.sampling = false;
                if self.state.play_state == PlayState::Playing {
                    // Failed loop restart
                    self.state.play_state = PlayState::Stopped;
                    self.state.position_secs = 0.0;
                }
                self.state.error = Some(PlaybackError::new(
                    failure.kind(),
                    failure.message().to_string(),
                ));
            }
        }
        self.notify();
    }

    fn on_ended(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if self.state.play_state != PlayState::Playing {
            return;
        }

        self.state.position_secs = 0.0;
        session.element.rewind();

        if session.options.looping {
            log::debug!("Track ended, looping");
            session.begin_start();
            self.state.starting = true;
            self.notify();
            return;
        }

        log::debug!("Track ended");
        session.element.pause();
        session.sampling = false;
        session.reached_end = true;
        self.state.play_state = PlayState::Stopped;
        let source = session.source.to_string();
        self.notify();

        self.listener.ended(&source);
        self.ended = Some(source);
    }

    fn release_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.element.release();
            log::debug!("Released session {}", session.binding);
        }
    }

    fn notify(&self) {
        self.listener.state_changed(&self.state);
    }
}

impl Drop for AudioController {
    fn drop(&mut self) {
        self.release_session();
    }
}

fn clamp_volume(volume: f32) -> Option<f32> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}

fn clamp_position(position: Duration, duration_secs: Option<f64>) -> f64 {
    let secs = position.as_secs_f64();
    match duration_secs {
        Some(total) => secs.min(total),
        None => secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{channel_delivery, Call, RecordingListener, ScriptedBackend};
    use crossbeam_channel::Receiver;

    const TEN_SECONDS: Duration = Duration::from_secs(10);

    struct Harness {
        controller: AudioController,
        backend: ScriptedBackend,
        listener: Arc<RecordingListener>,
        events: Receiver<MediaEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let backend = ScriptedBackend::new();
            let (deliver, events) = channel_delivery();
            let listener = Arc::new(RecordingListener::default());
            let controller =
                AudioController::new(Box::new(backend.clone()), deliver, listener.clone());
            Self {
                controller,
                backend,
                listener,
                events,
            }
        }

        fn pump(&mut self) {
            while let Ok(event) = self.events.try_recv() {
                self.controller.handle_media_event(event);
            }
        }

        /// Bind and deliver a successful load of a ten second track.
        fn bind_ready(&mut self, options: BindOptions) {
            self.controller.bind("/audio/theme.mp3", options);
            self.backend.element().emit(MediaEventKind::Loaded {
                duration: Some(TEN_SECONDS),
            });
            self.pump();
            assert_eq!(self.controller.state().ready_state, ReadyState::Ready);
        }

        /// Play and resolve the start successfully.
        fn start_playing(&mut self) {
            self.controller.play();
            self.backend.element().resolve_start(Ok(()));
            self.pump();
            assert_eq!(self.controller.state().play_state, PlayState::Playing);
        }

        /// Advance the player clock in 100ms steps, sampling after each.
        fn run_for(&mut self, total: Duration) {
            let step = Duration::from_millis(100);
            let mut elapsed = Duration::ZERO;
            while elapsed < total {
                self.backend.element().advance(step);
                self.controller.sample();
                elapsed += step;
            }
        }
    }

    #[test]
    fn bind_starts_loading_and_applies_volume() {
        let mut h = Harness::new();
        h.controller.bind(
            "/audio/theme.mp3",
            BindOptions {
                volume: 0.3,
                ..Default::default()
            },
        );

        let state = h.controller.state();
        assert_eq!(state.ready_state, ReadyState::Loading);
        assert_eq!(state.source.as_deref(), Some("/audio/theme.mp3"));
        assert_eq!(state.volume, 0.3);
        assert_eq!(h.backend.element().level(), 0.3);
        assert_eq!(h.backend.opened(), vec!["/audio/theme.mp3".to_string()]);
    }

    #[test]
    fn load_failure_is_captured_as_state() {
        let mut h = Harness::new();
        h.controller.bind("/audio/missing.mp3", BindOptions::default());
        h.backend.element().emit(MediaEventKind::LoadFailed {
            message: "Cannot open file".into(),
        });
        h.pump();

        let state = h.controller.state();
        assert_eq!(state.ready_state, ReadyState::Failed);
        let error = state.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::LoadError);
        assert_eq!(error.message, "Cannot open file");
        assert!(!state.controls_enabled());
    }

    #[test]
    fn blank_source_fails_without_opening_anything() {
        let mut h = Harness::new();
        h.controller.bind("  ", BindOptions::default());

        assert_eq!(h.controller.state().ready_state, ReadyState::Failed);
        assert!(h.backend.opened().is_empty());
        assert!(h.controller.binding().is_none());
    }

    #[test]
    fn open_failure_becomes_load_error() {
        let mut h = Harness::new();
        h.backend.fail_next_open("no output device");
        h.controller.bind("/audio/theme.mp3", BindOptions::default());

        let state = h.controller.state();
        assert_eq!(state.ready_state, ReadyState::Failed);
        assert_eq!(state.error.as_ref().unwrap().kind, ErrorKind::LoadError);
    }

    #[test]
    fn set_volume_clamps_out_of_range_values() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());

        h.controller.set_volume(-0.5);
        assert_eq!(h.controller.state().output_level(), 0.0);
        assert_eq!(h.backend.element().level(), 0.0);

        h.controller.set_volume(1.5);
        assert_eq!(h.controller.state().output_level(), 1.0);
        assert_eq!(h.backend.element().level(), 1.0);
    }

    #[test]
    fn nan_volume_is_ignored() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.controller.set_volume(0.5);
        h.controller.set_volume(f32::NAN);
        assert_eq!(h.controller.state().volume, 0.5);
    }

    #[test]
    fn volume_is_preserved_under_mute() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());

        h.controller.set_muted(true);
        assert_eq!(h.backend.element().level(), 0.0);
        h.controller.set_volume(0.4);
        assert_eq!(h.backend.element().level(), 0.0);
        h.controller.set_muted(false);

        assert_eq!(h.controller.state().output_level(), 0.4);
        assert_eq!(h.backend.element().level(), 0.4);
    }

    #[test]
    fn play_before_ready_is_a_no_op() {
        let mut h = Harness::new();
        h.controller.bind("/audio/theme.mp3", BindOptions::default());
        let notifications = h.listener.states().len();

        h.controller.play();

        let state = h.controller.state();
        assert_eq!(state.play_state, PlayState::Stopped);
        assert!(!state.starting);
        assert!(state.error.is_none());
        assert!(!h.backend.element().calls().contains(&Call::Start(1)));
        assert_eq!(h.listener.states().len(), notifications);
    }

    #[test]
    fn play_without_binding_is_a_no_op() {
        let mut h = Harness::new();
        h.controller.play();
        assert_eq!(h.controller.state().play_state, PlayState::Stopped);
        assert!(h.listener.states().is_empty());
    }

    #[test]
    fn play_state_waits_for_start_resolution() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());

        h.controller.play();
        assert!(h.controller.state().starting);
        assert_eq!(h.controller.state().play_state, PlayState::Stopped);

        h.backend.element().resolve_start(Ok(()));
        h.pump();
        assert!(!h.controller.state().starting);
        assert_eq!(h.controller.state().play_state, PlayState::Playing);
    }

    #[test]
    fn blocked_start_is_reported_without_playing() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());

        h.controller.play();
        h.backend
            .element()
            .resolve_start(Err(StartFailure::Blocked("autoplay denied".into())));
        h.pump();

        let state = h.controller.state();
        assert_eq!(state.play_state, PlayState::Stopped);
        assert_eq!(state.error.as_ref().unwrap().kind, ErrorKind::PlaybackBlocked);
        assert!(state.controls_enabled());

        // A later gesture-driven play clears the error.
        h.start_playing();
        assert!(h.controller.state().error.is_none());
    }

    #[test]
    fn other_start_failures_are_unknown() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.controller.play();
        h.backend
            .element()
            .resolve_start(Err(StartFailure::Other("device lost".into())));
        h.pump();
        assert_eq!(
            h.controller.state().error.as_ref().unwrap().kind,
            ErrorKind::Unknown
        );
    }

    #[test]
    fn pause_outside_playing_is_a_no_op() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        let notifications = h.listener.states().len();

        h.controller.pause();

        assert_eq!(h.controller.state().play_state, PlayState::Stopped);
        assert_eq!(h.listener.states().len(), notifications);
    }

    #[test]
    fn pause_before_start_resolves_wins() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());

        h.controller.play();
        h.controller.pause();
        h.backend.element().resolve_start(Ok(()));
        h.pump();

        let state = h.controller.state();
        assert_eq!(state.play_state, PlayState::Stopped);
        assert!(!state.starting);
        // The late start was paused again.
        let calls = h.backend.element().calls();
        assert_eq!(calls.last(), Some(&Call::Pause));
    }

    fn resolve_attempt(h: &mut Harness, attempt: u64) {
        h.backend.element().emit(MediaEventKind::PlayResolved {
            attempt,
            outcome: Ok(()),
        });
        h.pump();
    }

    #[test]
    fn replay_after_pause_survives_late_first_start() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());

        h.controller.play();
        h.controller.pause();
        h.controller.play();
        resolve_attempt(&mut h, 1);
        resolve_attempt(&mut h, 2);

        let el = h.backend.element();
        assert_eq!(h.controller.state().play_state, PlayState::Playing);
        assert!(el.is_running());
        assert_eq!(
            el.calls(),
            vec![Call::Level(0.7), Call::Start(1), Call::Pause, Call::Start(2)]
        );
    }

    #[test]
    fn replay_after_stop_survives_late_first_start() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());

        h.controller.play();
        h.controller.stop();
        h.controller.play();
        resolve_attempt(&mut h, 1);
        resolve_attempt(&mut h, 2);

        assert_eq!(h.controller.state().play_state, PlayState::Playing);
        assert!(h.backend.element().is_running());
        h.run_for(Duration::from_millis(500));
        assert!((h.controller.state().position_secs - 0.5).abs() < 1e-6);
    }

    #[test]
    fn natural_end_without_loop_stops_and_rewinds() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.start_playing();
        h.run_for(Duration::from_secs(2));

        h.backend.element().emit(MediaEventKind::Ended);
        h.pump();

        let state = h.controller.state();
        assert_eq!(state.play_state, PlayState::Stopped);
        assert_eq!(state.position_secs, 0.0);
        assert_eq!(h.listener.ended_sources(), vec!["/audio/theme.mp3".to_string()]);
        assert_eq!(h.controller.take_ended().as_deref(), Some("/audio/theme.mp3"));
        assert!(h.controller.take_ended().is_none());
    }

    #[test]
    fn natural_end_with_loop_restarts_from_zero() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions {
            looping: true,
            ..Default::default()
        });
        h.start_playing();
        h.run_for(Duration::from_secs(2));

        h.backend.element().emit(MediaEventKind::Ended);
        h.pump();
        assert_eq!(h.controller.state().play_state, PlayState::Playing);
        assert_eq!(h.controller.state().position_secs, 0.0);

        h.backend.element().resolve_start(Ok(()));
        h.pump();
        h.run_for(Duration::from_millis(500));

        let state = h.controller.state();
        assert_eq!(state.play_state, PlayState::Playing);
        assert!((state.position_secs - 0.5).abs() < 0.15);
        assert!(h.listener.ended_sources().is_empty());
        assert!(h
            .listener
            .states()
            .iter()
            .all(|s| s.play_state != PlayState::Stopped || s.position_secs == 0.0));
    }

    #[test]
    fn polled_end_is_detected_by_the_sampler() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.start_playing();

        h.backend.element().finish();
        h.controller.sample();

        assert_eq!(h.controller.state().play_state, PlayState::Stopped);
        assert_eq!(h.listener.ended_sources().len(), 1);
    }

    #[test]
    fn play_after_end_rewinds_first() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.start_playing();
        h.backend.element().emit(MediaEventKind::Ended);
        h.pump();

        h.controller.play();

        let calls = h.backend.element().calls();
        let start = calls.iter().rposition(|c| matches!(c, Call::Start(_))).unwrap();
        assert_eq!(calls[start - 1], Call::Rewind);
    }

    #[test]
    fn stop_while_paused_resets_position() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.start_playing();
        h.run_for(Duration::from_secs(1));
        h.controller.pause();
        assert_eq!(h.controller.state().play_state, PlayState::Paused);
        assert!(h.controller.state().position_secs > 0.5);

        h.controller.stop();

        let state = h.controller.state();
        assert_eq!(state.play_state, PlayState::Stopped);
        assert_eq!(state.position_secs, 0.0);
        assert_eq!(h.backend.element().current_time(), Duration::ZERO);
    }

    #[test]
    fn stale_play_resolution_after_unbind_is_ignored() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.controller.play();
        let element = h.backend.element();

        h.controller.unbind();
        let after_unbind = h.controller.state().clone();
        let notifications = h.listener.states().len();

        element.resolve_start(Ok(()));
        h.pump();

        assert_eq!(h.controller.state(), &after_unbind);
        assert_eq!(h.listener.states().len(), notifications);
        assert_eq!(after_unbind.ready_state, ReadyState::Unloaded);
        assert!(element.released());
    }

    #[test]
    fn events_from_a_previous_binding_are_ignored() {
        let mut h = Harness::new();
        h.controller.bind("/audio/first.mp3", BindOptions::default());
        let first = h.backend.element();

        h.controller.bind("/audio/second.mp3", BindOptions::default());
        first.emit(MediaEventKind::Loaded {
            duration: Some(TEN_SECONDS),
        });
        h.pump();

        assert!(first.released());
        assert_eq!(h.controller.state().ready_state, ReadyState::Loading);
        assert_eq!(h.controller.state().source.as_deref(), Some("/audio/second.mp3"));
    }

    #[test]
    fn sampling_tracks_position_and_pause_freezes_it() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions {
            volume: 0.3,
            ..Default::default()
        });
        h.start_playing();

        h.run_for(Duration::from_millis(3000));
        let position = h.controller.state().position_secs;
        assert!((position - 3.0).abs() <= 0.15, "position was {}", position);

        h.controller.pause();
        h.run_for(Duration::from_millis(1000));

        let frozen = h.controller.state().position_secs;
        assert!((frozen - 3.0).abs() <= 0.15, "position was {}", frozen);
        assert_eq!(h.controller.state().volume, 0.3);
    }

    #[test]
    fn position_is_clamped_to_duration() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.start_playing();
        h.backend.element().advance(Duration::from_secs(12));
        h.controller.sample();
        assert_eq!(h.controller.state().position_secs, 10.0);
    }

    #[test]
    fn autoplay_starts_once_ready() {
        let mut h = Harness::new();
        h.controller.bind(
            "/audio/theme.mp3",
            BindOptions {
                autoplay: true,
                ..Default::default()
            },
        );
        h.backend.element().emit(MediaEventKind::Loaded { duration: None });
        h.pump();

        assert!(h.controller.state().starting);
        h.backend.element().resolve_start(Ok(()));
        h.pump();
        assert!(h.controller.state().is_playing());
    }

    #[test]
    fn mute_survives_rebinding() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.controller.set_muted(true);

        h.controller.bind("/audio/next.mp3", BindOptions::default());

        assert!(h.controller.state().muted);
        assert_eq!(h.backend.element().level(), 0.0);
    }

    #[test]
    fn every_state_change_notifies() {
        let mut h = Harness::new();
        h.bind_ready(BindOptions::default());
        h.start_playing();
        h.controller.set_volume(0.2);
        h.controller.stop();

        let states = h.listener.states();
        assert_eq!(states.last().unwrap().play_state, PlayState::Stopped);
        assert!(states.iter().any(|s| s.volume == 0.2));
        assert!(states.iter().any(|s| s.ready_state == ReadyState::Loading));
    }
}
