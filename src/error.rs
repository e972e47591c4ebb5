// src/error.rs

//! Unified error handling for the pipeline runner.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration value out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Working directory is missing or not a directory
    #[error("cannot enter working directory {}: {source}", path.display())]
    WorkingDirectory { path: PathBuf, source: io::Error },

    /// The run log could not be opened or written
    #[error("cannot write run log {}: {source}", path.display())]
    Log { path: PathBuf, source: io::Error },

    /// A stage's command could not be started
    #[error("failed to launch {stage}: {source}")]
    Launch { stage: String, source: io::Error },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a run log error for the given path.
    pub fn log(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Log {
            path: path.into(),
            source,
        }
    }

    /// Create a launch error for the named stage.
    pub fn launch(stage: impl Into<String>, source: io::Error) -> Self {
        Self::Launch {
            stage: stage.into(),
            source,
        }
    }
}
