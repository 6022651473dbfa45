use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Error taxonomy for the console.
///
/// Every variant is caught at the dispatch boundary and printed; no error
/// from evaluating a single command terminates the session loop.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("controller error: {0}")]
    Protocol(String),
    #[error("{0}")]
    Validation(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("{0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ConsoleError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for ConsoleError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ConsoleError {
    fn from(err: csv::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
