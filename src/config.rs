//! Settings file handling.
//!
//! Settings live in `settings.toml` under the platform config directory
//! (`FOLIO_CONFIG_DIR` overrides it). Every section and field is optional in
//! the file; anything missing takes its default.
//!
//! ```toml
//! [audio]
//! track = "https://example.com/ambient.mp3"
//! default_volume = 0.7
//! looping = true
//!
//! [viewport]
//! mobile_max_width = 767
//!
//! [logging]
//! level = "debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::state::{BindOptions, DEFAULT_VOLUME};
use crate::error::{Error, Result};
use crate::viewport::Breakpoints;

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "folio";
const CONFIG_DIR_ENV: &str = "FOLIO_CONFIG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Track bound at startup, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    pub default_volume: f32,
    /// Same default as a plain bind: play once
    pub looping: bool,
    pub preload_eager: bool,
    pub sample_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            track: None,
            default_volume: DEFAULT_VOLUME,
            looping: false,
            preload_eager: true,
            sample_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub mobile_max_width: u32,
    pub tablet_max_width: u32,
    /// Scroll offset past which the floating controls appear
    pub scroll_threshold: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        let breakpoints = Breakpoints::default();
        Self {
            mobile_max_width: breakpoints.mobile_max_width,
            tablet_max_width: breakpoints.tablet_max_width,
            scroll_threshold: 400.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub viewport: ViewportConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Options for binding the configured track. Autoplay stays off; the
    /// first play comes from the visitor.
    pub fn bind_options(&self) -> BindOptions {
        BindOptions {
            volume: self.audio.default_volume.clamp(0.0, 1.0),
            looping: self.audio.looping,
            preload_eager: self.audio.preload_eager,
            autoplay: false,
        }
    }

    pub fn breakpoints(&self) -> Breakpoints {
        Breakpoints {
            mobile_max_width: self.viewport.mobile_max_width,
            tablet_max_width: self.viewport.tablet_max_width,
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.audio.sample_interval_ms.max(10))
    }

    /// Unknown level names fall back to `Info`.
    pub fn log_level(&self) -> log::LevelFilter {
        self.logging.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

fn config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path
    })
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from_path(&path),
        None => Config::default(),
    }
}

/// Missing or unreadable files give the defaults.
pub fn load_from_path(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            return Config::default();
        }
    };
    match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring invalid settings in {}: {}", path.display(), e);
            Config::default()
        }
    }
}

pub fn save(config: &Config) -> Result<()> {
    let path = config_path()
        .ok_or_else(|| Error::Config("No configuration directory on this platform".to_string()))?;
    save_to_path(config, &path)
}

pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
