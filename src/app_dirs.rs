use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `HOME` when set and non-blank, else the platform home, else the working directory.
    pub fn home_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            if !home.trim().is_empty() {
                return PathBuf::from(home);
            }
        }
        BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .filter(|home| !home.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn state_path(app_name: &str) -> Result<PathBuf> {
        Ok(Self::home_dir().join(state_file_name(app_name)?))
    }

    pub fn log_path(app_name: &str) -> PathBuf {
        let stem = normalized_app_name(app_name);
        let stem = if stem.is_empty() { "pagetype".to_string() } else { stem };
        Self::home_dir().join(format!(".{stem}.log"))
    }

    pub fn settings_path(app_name: &str) -> PathBuf {
        match ProjectDirs::from("", "", app_name) {
            Some(dirs) => dirs.config_dir().join("config.json"),
            None => Path::new(".").join(format!("{app_name}_config.json")),
        }
    }
}

fn normalized_app_name(app_name: &str) -> String {
    let name = app_name.trim();
    let name = name.strip_prefix('.').unwrap_or(name);
    let name = name.strip_suffix(".json").unwrap_or(name);
    name.to_lowercase()
}

/// `.<name>.json`, lowercased, whatever dots or suffix the caller already added.
pub fn state_file_name(app_name: &str) -> Result<String> {
    let name = normalized_app_name(app_name);
    if name.is_empty() {
        return Err(Error::invalid_input("application name cannot be empty"));
    }
    Ok(format!(".{name}.json"))
}
