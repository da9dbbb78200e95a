use std::path::PathBuf;
use thiserror::Error;

/// Every failure the library surfaces to the shell.
///
/// Messages are meant to be shown to the user as-is, so they stay short.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("could not read {path}: {message}")]
    AssetIo { path: String, message: String },
    #[error("saved progress in {} is unreadable", path.display())]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not save progress to {}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
    #[error(transparent)]
    Usage(#[from] clap::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn asset_io(path: impl Into<String>, message: impl ToString) -> Self {
        Self::AssetIo {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error: clap's convention for usage errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(err) => u8::try_from(err.exit_code()).unwrap_or(2),
            _ => 1,
        }
    }
}
