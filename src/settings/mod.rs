//! Key-value settings
//!
//! The reader only needs four values: the last visited entity id and the
//! two language lists. [`MemorySettings`] keeps them in memory;
//! [`JsonFileSettings`] persists them as a small JSON document.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RosetteConfig;
use crate::error::SettingsError;
use crate::languages::{LanguageSet, DEFAULT_DISPLAY_LANGUAGES, DEFAULT_SEARCH_PRIORITY};

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Persisted reader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub last_entity_id: Option<String>,
    pub display_languages: Vec<String>,
    pub search_priority_languages: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_entity_id: None,
            display_languages: DEFAULT_DISPLAY_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            search_priority_languages: DEFAULT_SEARCH_PRIORITY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Language set from the stored lists; invalid lists fall back to the
    /// defaults
    pub fn language_set(&self) -> LanguageSet {
        match LanguageSet::new(
            self.display_languages.iter().cloned(),
            self.search_priority_languages.iter().cloned(),
        ) {
            Ok(set) => set,
            Err(e) => {
                warn!(error = %e, "Stored languages are invalid, using defaults");
                LanguageSet::default()
            }
        }
    }
}

pub trait SettingsStore: Send + Sync {
    fn load(&self) -> SettingsResult<Settings>;

    fn store(&self, settings: &Settings) -> SettingsResult<()>;

    fn last_entity_id(&self) -> SettingsResult<Option<String>> {
        Ok(self.load()?.last_entity_id)
    }

    fn save_last_entity_id(&self, id: &str) -> SettingsResult<()> {
        let mut settings = self.load()?;
        if settings.last_entity_id.as_deref() == Some(id) {
            return Ok(());
        }
        settings.last_entity_id = Some(id.to_string());
        self.store(&settings)
    }

    fn display_languages(&self) -> SettingsResult<Vec<String>> {
        Ok(self.load()?.display_languages)
    }

    fn search_priority_languages(&self) -> SettingsResult<Vec<String>> {
        Ok(self.load()?.search_priority_languages)
    }

    /// Store both language lists from a validated set
    fn save_languages(&self, languages: &LanguageSet) -> SettingsResult<()> {
        let mut settings = self.load()?;
        settings.display_languages = languages.display().to_vec();
        settings.search_priority_languages = languages.search_priority().to_vec();
        self.store(&settings)
    }
}

/// File-backed store when a settings path is configured, in-memory otherwise
pub fn store_for(config: &RosetteConfig) -> Arc<dyn SettingsStore> {
    match &config.settings_path {
        Some(path) => Arc::new(JsonFileSettings::new(path.clone())),
        None => Arc::new(MemorySettings::default()),
    }
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    settings: Mutex<Settings>,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> SettingsResult<Settings> {
        Ok(self.settings.lock().unwrap().clone())
    }

    fn store(&self, settings: &Settings) -> SettingsResult<()> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

/// Settings stored as pretty-printed JSON; a missing file reads as defaults
#[derive(Debug, Clone)]
pub struct JsonFileSettings {
    path: PathBuf,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettings {
    fn load(&self) -> SettingsResult<Settings> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file yet");
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, settings: &Settings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
