//! Ordered track list advanced when the bound track ends.

use serde::{Deserialize, Serialize};

use crate::audio::state::RepeatMode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    tracks: Vec<String>,
    index: usize,
    repeat: RepeatMode,
}

impl Playlist {
    pub fn new(tracks: Vec<String>, repeat: RepeatMode) -> Self {
        Self {
            tracks,
            index: 0,
            repeat,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        self.repeat
    }

    pub fn current(&self) -> Option<&str> {
        self.tracks.get(self.index).map(String::as_str)
    }

    /// Track to bind after the current one ended naturally, honoring the
    /// repeat mode. `None` once an unrepeated list is exhausted.
    pub fn advance(&mut self) -> Option<&str> {
        if self.tracks.is_empty() {
            return None;
        }
        match self.repeat {
            RepeatMode::One => {}
            RepeatMode::All => self.index = (self.index + 1) % self.tracks.len(),
            RepeatMode::Off => {
                if self.index + 1 >= self.tracks.len() {
                    return None;
                }
                self.index += 1;
            }
        }
        self.current()
    }

    /// User skip forward. Always wraps.
    pub fn next(&mut self) -> Option<&str> {
        if self.tracks.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.tracks.len();
        self.current()
    }

    /// User skip back. Always wraps.
    pub fn previous(&mut self) -> Option<&str> {
        if self.tracks.is_empty() {
            return None;
        }
        self.index = self.index.checked_sub(1).unwrap_or(self.tracks.len() - 1);
        self.current()
    }
}
