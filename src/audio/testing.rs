//! Scriptable media backend and recording listener for driving the control
//! hook without an audio device.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::audio::controller::AudioListener;
use crate::audio::media::{
    EventDelivery, MediaBackend, MediaElement, MediaEvent, MediaEventKind, MediaEventSink,
    StartFailure,
};
use crate::audio::source::TrackSource;
use crate::audio::state::{AudioState, BindOptions};
use crate::error::{Error, Result};

/// Event delivery that queues into a channel, plus the receiving end.
pub fn channel_delivery() -> (EventDelivery, Receiver<MediaEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let deliver: EventDelivery = Arc::new(move |event| {
        let _ = tx.send(event);
    });
    (deliver, rx)
}

/// Calls an element received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(u64),
    Pause,
    Rewind,
    Level(f32),
    Release,
}

#[derive(Default)]
struct BackendState {
    opened: Vec<String>,
    elements: Vec<ElementHandle>,
    fail_next_open: Option<String>,
    load_on_open: Option<Option<Duration>>,
    resolve_on_start: Option<std::result::Result<(), StartFailure>>,
}

/// Backend whose elements are driven by hand. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<Mutex<BackendState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements report `Loaded` with `duration` as soon as they are opened.
    pub fn load_on_open(self, duration: Option<Duration>) -> Self {
        self.inner.lock().load_on_open = Some(duration);
        self
    }

    /// Elements resolve every start immediately with `outcome`.
    pub fn resolve_on_start(self, outcome: std::result::Result<(), StartFailure>) -> Self {
        self.inner.lock().resolve_on_start = Some(outcome);
        self
    }

    pub fn fail_next_open(&self, message: &str) {
        self.inner.lock().fail_next_open = Some(message.to_string());
    }

    /// Sources opened so far.
    pub fn opened(&self) -> Vec<String> {
        self.inner.lock().opened.clone()
    }

    /// Most recently opened element.
    ///
    /// # Panics
    /// If nothing was opened yet.
    pub fn element(&self) -> ElementHandle {
        self.inner
            .lock()
            .elements
            .last()
            .cloned()
            .expect("no element opened")
    }
}

impl MediaBackend for ScriptedBackend {
    fn open(
        &mut self,
        source: &TrackSource,
        _options: &BindOptions,
        events: MediaEventSink,
    ) -> Result<Box<dyn MediaElement>> {
        let (handle, load) = {
            let mut inner = self.inner.lock();
            if let Some(message) = inner.fail_next_open.take() {
                return Err(Error::AudioOutput(message));
            }
            let handle = ElementHandle {
                shared: Arc::new(Mutex::new(ElementState {
                    calls: Vec::new(),
                    level: 1.0,
                    clock: Duration::ZERO,
                    running: false,
                    ended: false,
                    released: false,
                    last_attempt: None,
                    resolve_on_start: inner.resolve_on_start.clone(),
                    sink: events,
                })),
            };
            inner.opened.push(source.to_string());
            inner.elements.push(handle.clone());
            (handle, inner.load_on_open)
        };

        if let Some(duration) = load {
            handle.emit(MediaEventKind::Loaded { duration });
        }
        Ok(Box::new(ScriptedElement { handle }))
    }
}

struct ElementState {
    calls: Vec<Call>,
    level: f32,
    clock: Duration,
    running: bool,
    ended: bool,
    released: bool,
    last_attempt: Option<u64>,
    resolve_on_start: Option<std::result::Result<(), StartFailure>>,
    sink: MediaEventSink,
}

/// Test-side view of one opened element.
#[derive(Clone)]
pub struct ElementHandle {
    shared: Arc<Mutex<ElementState>>,
}

impl ElementHandle {
    /// Post an event as the element would.
    pub fn emit(&self, kind: MediaEventKind) {
        let sink = self.shared.lock().sink.clone();
        sink.emit(kind);
    }

    /// Resolve the latest start request.
    ///
    /// # Panics
    /// If `start` was never called.
    pub fn resolve_start(&self, outcome: std::result::Result<(), StartFailure>) {
        let attempt = self.shared.lock().last_attempt.expect("start never called");
        self.emit(MediaEventKind::PlayResolved { attempt, outcome });
    }

    /// Move the player clock forward if it is running.
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.shared.lock();
        if state.running {
            state.clock += elapsed;
        }
    }

    /// Mark the track as played out, for sampler-detected ends.
    pub fn finish(&self) {
        self.shared.lock().ended = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().calls.clone()
    }

    pub fn level(&self) -> f32 {
        self.shared.lock().level
    }

    pub fn current_time(&self) -> Duration {
        self.shared.lock().clock
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn released(&self) -> bool {
        self.shared.lock().released
    }
}

struct ScriptedElement {
    handle: ElementHandle,
}

impl MediaElement for ScriptedElement {
    fn start(&mut self, attempt: u64) {
        let immediate = {
            let mut state = self.handle.shared.lock();
            state.calls.push(Call::Start(attempt));
            state.last_attempt = Some(attempt);
            state.running = true;
            state.resolve_on_start.clone()
        };
        if let Some(outcome) = immediate {
            if outcome.is_err() {
                self.handle.shared.lock().running = false;
            }
            self.handle.emit(MediaEventKind::PlayResolved { attempt, outcome });
        }
    }

    fn pause(&mut self) {
        let mut state = self.handle.shared.lock();
        state.calls.push(Call::Pause);
        state.running = false;
    }

    fn rewind(&mut self) {
        let mut state = self.handle.shared.lock();
        state.calls.push(Call::Rewind);
        state.clock = Duration::ZERO;
        state.ended = false;
    }

    fn set_output_level(&mut self, level: f32) {
        let mut state = self.handle.shared.lock();
        state.calls.push(Call::Level(level));
        state.level = level;
    }

    fn current_time(&self) -> Duration {
        self.handle.current_time()
    }

    fn has_ended(&self) -> bool {
        self.handle.shared.lock().ended
    }

    fn release(&mut self) {
        let mut state = self.handle.shared.lock();
        state.calls.push(Call::Release);
        state.running = false;
        state.released = true;
    }
}

/// Listener that keeps every notification.
#[derive(Default)]
pub struct RecordingListener {
    states: Mutex<Vec<AudioState>>,
    ended: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn states(&self) -> Vec<AudioState> {
        self.states.lock().clone()
    }

    pub fn ended_sources(&self) -> Vec<String> {
        self.ended.lock().clone()
    }
}

impl AudioListener for RecordingListener {
    fn state_changed(&self, state: &AudioState) {
        self.states.lock().push(state.clone());
    }

    fn ended(&self, source: &str) {
        self.ended.lock().push(source.to_string());
    }
}
