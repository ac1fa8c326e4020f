//! Theme and language preferences.
//!
//! `SiteContext` is the handle the rest of the site receives explicitly; it
//! holds the current preferences and writes every change through a
//! `PreferenceStore`. A failed write is logged and the in-memory value kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::error::Result;

const PREFS_FILE: &str = "preferences.json";
const APP_NAME: &str = "folio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Spanish];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Spanish => "es",
        }
    }

    pub fn langid(&self) -> LanguageIdentifier {
        match self {
            Language::English => unic_langid::langid!("en-US"),
            Language::Spanish => unic_langid::langid!("es"),
        }
    }

    /// Match a locale string by its primary language subtag.
    pub fn from_code(code: &str) -> Option<Self> {
        let id: LanguageIdentifier = code.parse().ok()?;
        Language::ALL
            .into_iter()
            .find(|lang| lang.langid().language == id.language)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub language: Language,
}

/// Persistent storage for preferences.
pub trait PreferenceStore: Send + Sync {
    /// `Ok(None)` when nothing was stored yet.
    fn load(&self) -> Result<Option<Preferences>>;
    fn save(&self, prefs: &Preferences) -> Result<()>;
}

/// JSON file in the platform data directory.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's data directory, if the platform has one.
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|mut path| {
            path.push(APP_NAME);
            path.push(PREFS_FILE);
            Self::new(path)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self) -> Result<Option<Preferences>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&content) {
            Ok(prefs) => Ok(Some(prefs)),
            Err(e) => {
                log::warn!("Ignoring unreadable preferences {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(prefs)?)?;
        Ok(())
    }
}

/// Store that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Option<Preferences>>,
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<Option<Preferences>> {
        Ok(*self.saved.lock())
    }

    fn save(&self, prefs: &Preferences) -> Result<()> {
        *self.saved.lock() = Some(*prefs);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SiteContext {
    prefs: Arc<RwLock<Preferences>>,
    store: Arc<dyn PreferenceStore>,
}

impl SiteContext {
    /// Restore saved preferences, or start from `fallback`.
    pub fn load(store: Arc<dyn PreferenceStore>, fallback: Preferences) -> Self {
        let prefs = match store.load() {
            Ok(Some(prefs)) => prefs,
            Ok(None) => fallback,
            Err(e) => {
                log::warn!("Failed to load preferences: {}", e);
                fallback
            }
        };
        Self {
            prefs: Arc::new(RwLock::new(prefs)),
            store,
        }
    }

    pub fn preferences(&self) -> Preferences {
        *self.prefs.read()
    }

    pub fn theme(&self) -> Theme {
        self.prefs.read().theme
    }

    pub fn language(&self) -> Language {
        self.prefs.read().language
    }

    pub fn set_theme(&self, theme: Theme) -> Preferences {
        self.update(|prefs| prefs.theme = theme)
    }

    pub fn toggle_theme(&self) -> Preferences {
        self.update(|prefs| prefs.theme = prefs.theme.toggle())
    }

    pub fn set_language(&self, language: Language) -> Preferences {
        self.update(|prefs| prefs.language = language)
    }

    fn update(&self, f: impl FnOnce(&mut Preferences)) -> Preferences {
        let snapshot = {
            let mut prefs = self.prefs.write();
            f(&mut prefs);
            *prefs
        };
        if let Err(e) = self.store.save(&snapshot) {
            log::warn!("Failed to save preferences: {}", e);
        }
        log::debug!("Preferences updated: {:?}", snapshot);
        snapshot
    }
}
