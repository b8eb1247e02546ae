//! Error types for keysync.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::clients::users::FetchError;
use crate::config::ConfigError;

/// Errors that abort a reconciliation cycle (or startup).
#[derive(Debug, Error)]
pub enum Error {
    /// A filesystem primitive failed.
    #[error("{action} {}: {error}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        error: io::Error,
    },

    /// The user directory could not be queried.
    #[error("failed to fetch users: {0}")]
    RemoteFetch(FetchError),

    /// Configuration is malformed.
    #[error("invalid configuration: {0}")]
    Config(ConfigError),

    /// Shutdown was requested while the cycle was running.
    #[error("cycle cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn io(action: &'static str, path: &Path, error: io::Error) -> Self {
        Error::Io {
            action,
            path: path.to_path_buf(),
            error,
        }
    }
}

// Messages include the cause, so no variant reports a `source()`.

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Self {
        Error::RemoteFetch(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Result type for keysync operations.
pub type Result<T> = std::result::Result<T, Error>;
