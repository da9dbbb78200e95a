use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// User settings, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Overrides the state file name (`.<state_name>.json`).
    pub state_name: Option<String>,
    /// Rows kept visible above the cursor line while typing.
    pub context_rows: u16,
    pub debug_overlay: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_name: None,
            context_rows: 3,
            debug_overlay: false,
        }
    }
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(app_name: &str) -> Self {
        Self {
            path: AppDirs::settings_path(app_name),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => return settings,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable settings")
                }
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileSettingsStore::with_path(&path);
        assert_eq!(store.path(), path);
        let settings = Settings::default();
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn save_and_load_custom_settings() {
        let dir = tempdir().unwrap();
        let store = FileSettingsStore::with_path(dir.path().join("nested/config.json"));
        let settings = Settings {
            state_name: Some("novels".into()),
            context_rows: 1,
            debug_overlay: true,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"debug_overlay": true}"#).unwrap();
        let loaded = FileSettingsStore::with_path(&path).load();
        assert!(loaded.debug_overlay);
        assert_eq!(loaded.context_rows, 3);
        assert_eq!(loaded.state_name, None);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json").unwrap();
        assert_eq!(FileSettingsStore::with_path(&path).load(), Settings::default());
    }
}
