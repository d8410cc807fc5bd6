//! # Host Error Types

use std::io;
use std::path::PathBuf;

use cogalert_core::DispatchError;
use cogalert_networking::ListenerError;
use thiserror::Error;

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File we tried to read.
        path: PathBuf,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that abort host startup.
#[derive(Error, Debug)]
pub enum HostError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listener could not start.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The queue refused the consumer.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Signal handlers could not be installed.
    #[error("failed to install shutdown handler: {0}")]
    Signal(#[source] io::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
