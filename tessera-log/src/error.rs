//! Error types for loggers and appenders.

use std::io;
use std::path::PathBuf;

use tessera_config::ConfigError;
use thiserror::Error;

/// Result alias for logging operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors emitted while building or reconfiguring loggers.
#[derive(Debug, Error)]
pub enum LogError {
    /// A log file could not be opened.
    #[error("cannot open log file `{}`: {source}", .path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A formatter pattern contained malformed directives.
    #[error("invalid log pattern `{pattern}`")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
    },

    /// The logging configuration variable could not be registered.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
