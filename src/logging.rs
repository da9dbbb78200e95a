use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

/// Environment variable holding the filter directive; logging is off when unset.
pub const LOG_ENV: &str = "PAGETYPE_LOG";

/// Sends `tracing` output to `<home>/.<app_name>.log` when `PAGETYPE_LOG` is set.
///
/// The terminal belongs to the UI, so nothing is ever written to stdout or
/// stderr. Returns whether a subscriber was installed.
pub fn init(app_name: &str) -> bool {
    let Ok(directive) = std::env::var(LOG_ENV) else {
        return false;
    };
    let filter = match EnvFilter::try_new(directive.trim()) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };
    let path = AppDirs::log_path(app_name);
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return false;
    };
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .is_ok();
    if installed {
        tracing::info!(app = app_name, path = %path.display(), "logging started");
    }
    installed
}
