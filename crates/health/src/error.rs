use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HealthError>;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Pattern scan error: {0}")]
    PatternScanError(#[from] codehealth_pattern_scan::PatternScanError),

    #[error("Invalid root path: {0}")]
    InvalidPath(String),

    #[error("monitor {0:?} already registered")]
    DuplicateMonitor(String),

    #[error("monitor {0:?} not registered")]
    UnknownMonitor(String),

    /// Directory-level walk failure; the whole check is aborted
    #[error("walking {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("check cancelled")]
    Cancelled,

    /// The in-memory state was mutated but could not be made durable
    #[error("persisting monitor state to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing monitor state {path}: {source}")]
    StateParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl HealthError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the error came from the caller's cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
