// Library surface shared by both binaries and the integration tests.
pub mod app_dirs;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod menu;
pub mod metrics;
pub mod runtime;
pub mod session;
pub mod shell;
pub mod stats;
pub mod store;
pub mod ui;
pub mod util;
pub mod whitespace;

pub use error::{Error, Result};
