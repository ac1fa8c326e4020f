//! The seam between the control hook and a concrete player.
//!
//! A `MediaBackend` allocates one `MediaElement` per bound track. Elements
//! report asynchronous outcomes (load complete, load error, play resolution,
//! end of track) through the `MediaEventSink` they were opened with. Every
//! event carries the binding generation of the session that opened the
//! element, so events outliving their session can be recognized and dropped.

use std::sync::Arc;
use std::time::Duration;

use crate::audio::source::TrackSource;
use crate::audio::state::{BindOptions, ErrorKind};
use crate::error::Result;

/// Why the underlying player refused to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartFailure {
    /// Blocked by platform policy (e.g. autoplay restrictions)
    Blocked(String),
    Other(String),
}

impl StartFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StartFailure::Blocked(_) => ErrorKind::PlaybackBlocked,
            StartFailure::Other(_) => ErrorKind::Unknown,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            StartFailure::Blocked(msg) | StartFailure::Other(msg) => msg,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    Loaded { duration: Option<Duration> },
    LoadFailed { message: String },
    PlayResolved {
        attempt: u64,
        outcome: std::result::Result<(), StartFailure>,
    },
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub binding: u64,
    pub kind: MediaEventKind,
}

pub type EventDelivery = Arc<dyn Fn(MediaEvent) + Send + Sync>;

/// Callback handle given to an element when it is opened.
#[derive(Clone)]
pub struct MediaEventSink {
    binding: u64,
    deliver: EventDelivery,
}

impl MediaEventSink {
    pub fn new(binding: u64, deliver: EventDelivery) -> Self {
        Self { binding, deliver }
    }

    pub fn binding(&self) -> u64 {
        self.binding
    }

    pub fn emit(&self, kind: MediaEventKind) {
        (self.deliver)(MediaEvent {
            binding: self.binding,
            kind,
        });
    }
}

/// One allocated playable resource.
pub trait MediaElement {
    /// Begin playback. The outcome is reported later as
    /// `MediaEventKind::PlayResolved` carrying the same `attempt`.
    fn start(&mut self, attempt: u64);

    fn pause(&mut self);

    /// Move back to the beginning without starting.
    fn rewind(&mut self);

    fn set_output_level(&mut self, level: f32);

    /// Elapsed playback time as the player sees it.
    fn current_time(&self) -> Duration;

    /// Polled by the position sampler for players that cannot push `Ended`.
    fn has_ended(&self) -> bool {
        false
    }

    /// Free the native resource. No events are expected afterwards.
    fn release(&mut self);
}

/// Allocates media elements.
pub trait MediaBackend {
    fn open(
        &mut self,
        source: &TrackSource,
        options: &BindOptions,
        events: MediaEventSink,
    ) -> Result<Box<dyn MediaElement>>;
}
