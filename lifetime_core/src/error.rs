use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Setup-time failures. Nothing inside a scheduler tick produces one of these.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid lifetime bounds: min_lifetime={min} max_lifetime={max}")]
    InvalidLifetimeBounds { min: i64, max: i64 },

    #[error("invalid value for argument '{key}': {value:?}")]
    InvalidArgument { key: &'static str, value: String },

    #[error("argument '{0}' expects a value")]
    MissingArgumentValue(&'static str),

    #[error("config read failed: path={path:?}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config parse failed (toml): path={path:?}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("exit signal handler install failed: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("logger init failed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Failure reported by a [`crate::host::LifetimeHost`].
///
/// The scheduler logs these and keeps going; the list transition still happens.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to spawn client '{name}'")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to stop client '{name}'")]
    Stop {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Other(String),
}
