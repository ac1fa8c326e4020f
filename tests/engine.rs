use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use folio_lib::audio::media::MediaBackend;
use folio_lib::audio::state::ErrorKind;
use folio_lib::audio::testing::{Call, RecordingListener, ScriptedBackend};
use folio_lib::audio::{AudioEngineHandle, AudioState, BindOptions, PlayState, Playlist, ReadyState, RepeatMode};
use folio_lib::Error;

const TRACK_A: &str = "https://example.com/a.mp3";
const TRACK_B: &str = "https://example.com/b.mp3";

fn start_engine(backend: &ScriptedBackend, listener: Arc<RecordingListener>) -> AudioEngineHandle {
    let backend = backend.clone();
    AudioEngineHandle::with_backend(
        Box::new(move || Ok(Box::new(backend) as Box<dyn MediaBackend>)),
        listener,
        Duration::from_millis(10),
    )
    .expect("engine should start")
}

fn wait_for(engine: &AudioEngineHandle, what: &str, pred: impl Fn(&AudioState) -> bool) -> AudioState {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let state = engine.get_state();
        if pred(&state) {
            return state;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {}: {:?}", what, state);
        thread::sleep(Duration::from_millis(5));
    }
}

fn wait_until(what: &str, pred: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !pred() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn bind_play_pause_through_the_engine() {
    let backend = ScriptedBackend::new()
        .load_on_open(Some(Duration::from_secs(10)))
        .resolve_on_start(Ok(()));
    let engine = start_engine(&backend, Arc::new(RecordingListener::default()));

    engine.bind(TRACK_A, BindOptions::default()).unwrap();
    let state = wait_for(&engine, "ready", |s| s.ready_state == ReadyState::Ready);
    assert_eq!(state.duration_secs, Some(10.0));
    assert_eq!(state.source.as_deref(), Some(TRACK_A));

    engine.play();
    wait_for(&engine, "playing", |s| s.play_state == PlayState::Playing);

    engine.pause();
    wait_for(&engine, "paused", |s| s.play_state == PlayState::Paused);
    assert_eq!(backend.opened(), vec![TRACK_A.to_string()]);
}

#[test]
fn toggles_follow_current_state() {
    let backend = ScriptedBackend::new()
        .load_on_open(None)
        .resolve_on_start(Ok(()));
    let engine = start_engine(&backend, Arc::new(RecordingListener::default()));

    engine.bind(TRACK_A, BindOptions::default()).unwrap();
    wait_for(&engine, "ready", |s| s.ready_state == ReadyState::Ready);

    engine.toggle_play();
    wait_for(&engine, "playing", |s| s.is_playing());
    engine.toggle_play();
    wait_for(&engine, "paused", |s| s.play_state == PlayState::Paused);

    engine.toggle_mute();
    let state = wait_for(&engine, "muted", |s| s.muted);
    assert_eq!(state.output_level(), 0.0);
    wait_until("element silenced", || backend.element().level() == 0.0);
}

#[test]
fn late_start_after_pause_is_silenced() {
    let backend = ScriptedBackend::new().load_on_open(None);
    let engine = start_engine(&backend, Arc::new(RecordingListener::default()));

    engine.bind(TRACK_A, BindOptions::default()).unwrap();
    wait_for(&engine, "ready", |s| s.ready_state == ReadyState::Ready);

    engine.play();
    wait_for(&engine, "starting", |s| s.starting);
    engine.pause();
    wait_for(&engine, "start cancelled", |s| !s.starting);

    backend.element().resolve_start(Ok(()));
    wait_until("second pause", || {
        backend
            .element()
            .calls()
            .iter()
            .filter(|call| **call == Call::Pause)
            .count()
            == 2
    });
    assert!(!backend.element().is_running());
    assert_ne!(engine.get_state().play_state, PlayState::Playing);
}

#[test]
fn playlist_advances_when_a_track_ends() {
    let backend = ScriptedBackend::new()
        .load_on_open(Some(Duration::from_secs(3)))
        .resolve_on_start(Ok(()));
    let listener = Arc::new(RecordingListener::default());
    let engine = start_engine(&backend, listener.clone());

    let playlist = Playlist::new(vec![TRACK_A.to_string(), TRACK_B.to_string()], RepeatMode::Off);
    let options = BindOptions {
        autoplay: true,
        ..BindOptions::default()
    };
    engine.set_playlist(playlist, options).unwrap();
    wait_for(&engine, "first track playing", |s| {
        s.is_playing() && s.source.as_deref() == Some(TRACK_A)
    });

    backend.element().finish();
    wait_for(&engine, "second track playing", |s| {
        s.is_playing() && s.source.as_deref() == Some(TRACK_B)
    });
    assert_eq!(listener.ended_sources(), vec![TRACK_A.to_string()]);

    backend.element().finish();
    wait_until("second end reported", || listener.ended_sources().len() == 2);
    let state = wait_for(&engine, "stopped", |s| s.play_state == PlayState::Stopped);
    assert_eq!(state.source.as_deref(), Some(TRACK_B));
}

#[test]
fn skipping_keeps_playing() {
    let backend = ScriptedBackend::new()
        .load_on_open(None)
        .resolve_on_start(Ok(()));
    let engine = start_engine(&backend, Arc::new(RecordingListener::default()));

    let playlist = Playlist::new(vec![TRACK_A.to_string(), TRACK_B.to_string()], RepeatMode::All);
    engine.set_playlist(playlist, BindOptions::default()).unwrap();
    wait_for(&engine, "ready", |s| s.ready_state == ReadyState::Ready);
    engine.play();
    wait_for(&engine, "playing", |s| s.is_playing());

    engine.next();
    wait_for(&engine, "next track playing", |s| {
        s.is_playing() && s.source.as_deref() == Some(TRACK_B)
    });
    engine.previous();
    wait_for(&engine, "previous track playing", |s| {
        s.is_playing() && s.source.as_deref() == Some(TRACK_A)
    });
}

#[test]
fn unavailable_output_is_reported_as_state() {
    let engine = AudioEngineHandle::with_backend(
        Box::new(|| Err(Error::AudioOutput("no device".to_string()))),
        Arc::new(RecordingListener::default()),
        Duration::from_millis(10),
    )
    .unwrap();

    let state = wait_for(&engine, "failed", |s| s.ready_state == ReadyState::Failed);
    assert_eq!(state.error.map(|e| e.kind), Some(ErrorKind::LoadError));
}

#[test]
fn dropping_the_engine_releases_the_element() {
    let backend = ScriptedBackend::new().load_on_open(None);
    let engine = start_engine(&backend, Arc::new(RecordingListener::default()));

    engine.bind(TRACK_A, BindOptions::default()).unwrap();
    wait_for(&engine, "ready", |s| s.ready_state == ReadyState::Ready);
    let element = backend.element();

    drop(engine);
    assert!(element.released());
}
