// fusion_replay/src/error.rs

use fusion_core::error::FilterError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single log line could not become a measurement package.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown sensor tag '{0}'")]
    UnknownSensor(String),
    #[error("expected at least {expected} fields after the tag, found {actual}")]
    MissingFields { expected: usize, actual: usize },
    #[error("field {index} ('{value}') is not a number")]
    InvalidNumber { index: usize, value: String },
    #[error("measurement rejected: {0}")]
    Measurement(#[from] FilterError),
}

/// Errors that end a replay run.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Cannot open input file: {}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot open output file: {}", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] FilterError),
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<figment::Error> for ReplayError {
    fn from(err: figment::Error) -> Self {
        ReplayError::Config(Box::new(err))
    }
}
