//! User settings: a flat JSON object of toggles merged over defaults.
//!
//! Keys the application does not know about are kept and written back, so
//! a newer client's settings survive a round-trip through an older server.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::AppError;

pub type Settings = Map<String, Value>;

/// Built-in settings.
pub fn defaults() -> Settings {
    let value = json!({
        "voice_output": true,
        "voice_recognition": true,
        "auto_save_history": true,
        "night_mode": false,
        "font_size": "medium",
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub struct SettingsStore {
    path: PathBuf,
    current: Mutex<Settings>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing file is created with the
    /// defaults; an unreadable or malformed one is logged and ignored.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        let mut settings = defaults();
        if path.exists() {
            match fs::read_to_string(path).map_err(|e| e.to_string()).and_then(|text| {
                serde_json::from_str::<Settings>(&text).map_err(|e| e.to_string())
            }) {
                Ok(saved) => settings.extend(saved),
                Err(e) => warn!(path = %path.display(), "ignoring unreadable settings: {e}"),
            }
        } else {
            info!(path = %path.display(), "creating default settings file");
            write(path, &settings)?;
        }
        Ok(Self { path: path.to_path_buf(), current: Mutex::new(settings) })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Settings> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> Settings {
        self.lock().clone()
    }

    /// Boolean toggle `key`; `false` when absent or not a boolean.
    pub fn flag(&self, key: &str) -> bool {
        self.lock().get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Persist the current settings.
    pub fn save(&self) -> Result<(), AppError> {
        write(&self.path, &self.lock())
    }

    /// Merge `patch` into the current settings and persist. Memory is only
    /// changed once the file is written.
    pub fn update(&self, patch: Settings) -> Result<Settings, AppError> {
        let mut current = self.lock();
        let mut next = current.clone();
        next.extend(patch);
        self.commit(&mut current, next)?;
        debug!(path = %self.path.display(), "settings updated");
        Ok(current.clone())
    }

    /// Restore the defaults and persist.
    pub fn reset(&self) -> Result<Settings, AppError> {
        let mut current = self.lock();
        self.commit(&mut current, defaults())?;
        info!("settings reset to defaults");
        Ok(current.clone())
    }

    fn commit(&self, current: &mut Settings, next: Settings) -> Result<(), AppError> {
        write(&self.path, &next)?;
        *current = next;
        Ok(())
    }
}

fn write(path: &Path, settings: &Settings) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Config(format!("serialise settings: {e}")))?;
    fs::write(path, data)
        .map_err(|e| AppError::Config(format!("cannot write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.get(), defaults());
        assert!(store.flag("auto_save_history"));
        assert!(!store.flag("night_mode"));
    }

    #[test]
    fn saved_values_overlay_defaults_and_unknown_keys_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"night_mode": true, "theme": "blue"}"#).unwrap();
        let store = SettingsStore::open(&path).unwrap();
        let s = store.get();
        assert_eq!(s["night_mode"], json!(true));
        assert_eq!(s["theme"], json!("blue"));
        assert_eq!(s["font_size"], json!("medium"));
    }

    #[test]
    fn malformed_file_falls_back_without_overwriting() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.get(), defaults());
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn update_and_reset_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();

        let mut patch = Settings::new();
        patch.insert("font_size".into(), json!("large"));
        store.update(patch).unwrap();
        let reread = SettingsStore::open(&path).unwrap();
        assert_eq!(reread.get()["font_size"], json!("large"));

        store.reset().unwrap();
        assert_eq!(SettingsStore::open(&path).unwrap().get(), defaults());

        fs::remove_file(&path).unwrap();
        store.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::open(&path).unwrap();
        let mut patch = Settings::new();
        patch.insert("night_mode".into(), json!(true));
        store.update(patch.clone()).unwrap();

        // A directory where the file should be makes every write fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        patch.insert("font_size".into(), json!("small"));
        assert!(store.update(patch).is_err());
        assert_eq!(store.get()["font_size"], json!("medium"));

        assert!(store.reset().is_err());
        assert!(store.flag("night_mode"));
    }
}
