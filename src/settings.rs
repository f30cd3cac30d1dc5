//! Persisted preferences (XDG config or ~/.config/tilecrush) and shared storage helpers.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "tilecrush";
const FILENAME: &str = "settings.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no config directory (HOME and XDG_CONFIG_HOME unset)")]
    NoConfigDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Config dir / tilecrush.
pub fn config_dir() -> Result<PathBuf, StorageError> {
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .map_err(|_| StorageError::NoConfigDir)?,
    };
    Ok(base.join(APP_DIR))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// User preferences that survive restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_sound")]
    pub sound_enabled: bool,
}

fn default_sound() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: default_sound(),
        }
    }
}

impl Settings {
    pub fn path() -> Result<PathBuf, StorageError> {
        Ok(config_dir()?.join(FILENAME))
    }

    /// Missing or unreadable file gives defaults.
    pub fn load() -> Self {
        match Self::path().and_then(|p| Self::load_from(&p)) {
            Ok(s) => s,
            Err(e) => {
                log::info!("using default settings: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, StorageError> {
        read_json(path)
    }

    pub fn save(&self) -> Result<(), StorageError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StorageError> {
        write_json(path, self)
    }

    pub fn toggle_sound(&mut self) {
        self.sound_enabled = !self.sound_enabled;
    }
}
