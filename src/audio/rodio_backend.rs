//! Native media backend using Rodio.
//!
//! Each bound track gets its own `Sink`. A loader thread reads the payload,
//! probes it and, with eager preloading, decodes and queues it before
//! reporting `Loaded`. The `OutputStream` is not Send, so the backend lives
//! on the audio thread.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::audio::media::{MediaBackend, MediaElement, MediaEventKind, MediaEventSink, StartFailure};
use crate::audio::probe::probe_duration;
use crate::audio::source::TrackSource;
use crate::audio::state::BindOptions;
use crate::error::{Error, Result};

pub struct RodioBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Open the default output device.
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| Error::AudioOutput(format!("Audio output unavailable: {}", e)))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl MediaBackend for RodioBackend {
    fn open(
        &mut self,
        source: &TrackSource,
        options: &BindOptions,
        events: MediaEventSink,
    ) -> Result<Box<dyn MediaElement>> {
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| Error::AudioOutput(format!("Failed to initialize audio: {}", e)))?;
        sink.pause();

        let element = RodioElement {
            sink: Arc::new(sink),
            payload: Arc::new(Mutex::new(None)),
            queued: Arc::new(AtomicBool::new(false)),
            released: Arc::new(AtomicBool::new(false)),
            position: PositionTracker::new(),
            events,
        };

        let loader = Loader {
            source: source.clone(),
            eager: options.preload_eager,
            sink: element.sink.clone(),
            payload: element.payload.clone(),
            queued: element.queued.clone(),
            released: element.released.clone(),
            events: element.events.clone(),
        };
        thread::Builder::new()
            .name("folio-audio-loader".into())
            .spawn(move || loader.run())?;

        Ok(Box::new(element))
    }
}

struct Loader {
    source: TrackSource,
    eager: bool,
    sink: Arc<Sink>,
    payload: Arc<Mutex<Option<Bytes>>>,
    queued: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
    events: MediaEventSink,
}

impl Loader {
    fn run(self) {
        let result = self.load();
        if self.released.load(Ordering::Acquire) {
            log::debug!("Discarding load of released {}", self.source);
            return;
        }
        match result {
            Ok(duration) => self.events.emit(MediaEventKind::Loaded { duration }),
            Err(e) => {
                log::debug!("Loading {} failed: {}", self.source, e);
                self.events.emit(MediaEventKind::LoadFailed {
                    message: e.to_string(),
                });
            }
        }
    }

    fn load(&self) -> Result<Option<Duration>> {
        let bytes = self.source.read_bytes()?;
        let duration = probe_duration(bytes.clone(), self.source.extension().as_deref())?;

        // Held across the check so release() cannot slip in before append.
        let mut payload = self.payload.lock();
        if self.released.load(Ordering::Acquire) {
            return Ok(duration);
        }
        if self.eager {
            self.sink.append(decoder_for(bytes.clone())?);
            self.queued.store(true, Ordering::Release);
        }
        *payload = Some(bytes);
        Ok(duration)
    }
}

fn decoder_for(bytes: Bytes) -> Result<Decoder<Cursor<Bytes>>> {
    Decoder::new(Cursor::new(bytes))
        .map_err(|e| Error::Decode(format!("Unsupported audio format: {}", e)))
}

struct RodioElement {
    sink: Arc<Sink>,
    /// Raw track data, kept so the track can be queued again after a rewind
    payload: Arc<Mutex<Option<Bytes>>>,
    queued: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
    position: PositionTracker,
    events: MediaEventSink,
}

impl RodioElement {
    fn ensure_queued(&mut self) -> Result<()> {
        if self.queued.load(Ordering::Acquire) {
            return Ok(());
        }
        let bytes = self
            .payload
            .lock()
            .clone()
            .ok_or_else(|| Error::Decode("Track not loaded".to_string()))?;
        self.sink.append(decoder_for(bytes)?);
        self.queued.store(true, Ordering::Release);
        Ok(())
    }
}

impl MediaElement for RodioElement {
    fn start(&mut self, attempt: u64) {
        let outcome = self
            .ensure_queued()
            .map_err(|e| StartFailure::Other(e.to_string()));
        if outcome.is_ok() {
            self.sink.play();
            self.position.start();
        }
        self.events.emit(MediaEventKind::PlayResolved { attempt, outcome });
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.position.pause();
    }

    fn rewind(&mut self) {
        self.sink.stop();
        self.queued.store(false, Ordering::Release);
        self.position.reset();
    }

    fn set_output_level(&mut self, level: f32) {
        self.sink.set_volume(level);
    }

    fn current_time(&self) -> Duration {
        self.position.position()
    }

    fn has_ended(&self) -> bool {
        self.queued.load(Ordering::Acquire) && self.position.is_playing() && self.sink.empty()
    }

    fn release(&mut self) {
        let mut payload = self.payload.lock();
        self.released.store(true, Ordering::Release);
        *payload = None;
        self.sink.stop();
        self.position.reset();
    }
}

/// Tracks playback position using wall-clock time.
///
/// Since Rodio doesn't expose the current playback position, we track it
/// by measuring elapsed time while playing.
struct PositionTracker {
    /// When playback started (or resumed)
    play_start: Option<Instant>,
    /// Accumulated position from previous play segments
    accumulated: Duration,
}

impl PositionTracker {
    fn new() -> Self {
        Self {
            play_start: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Start or resume tracking
    fn start(&mut self) {
        if self.play_start.is_none() {
            self.play_start = Some(Instant::now());
        }
    }

    /// Pause tracking, accumulating elapsed time
    fn pause(&mut self) {
        if let Some(start) = self.play_start.take() {
            self.accumulated += start.elapsed();
        }
    }

    fn reset(&mut self) {
        self.play_start = None;
        self.accumulated = Duration::ZERO;
    }

    fn position(&self) -> Duration {
        let current_segment = self
            .play_start
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO);
        self.accumulated + current_segment
    }

    fn is_playing(&self) -> bool {
        self.play_start.is_some()
    }
}
