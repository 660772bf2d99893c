//! Common error types for the project batch driver

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for batch driver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal, pre-flight error categories shared by every operation family
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed environment configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Work list file does not exist
    #[error("Work list not found: '{}'", .0.display())]
    WorkListNotFound(PathBuf),

    /// Work list exists but cannot be parsed (encoding, broken records)
    #[error("Work list unreadable: {0}")]
    WorkList(String),

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::WorkList(err.to_string())
    }
}
