//! Error handling for the solver dispatcher and the configuration reader

use std::io;

/// Unified error to report failures of both configuration loading and IK dispatch.
#[derive(Debug)]
pub enum PandaError {
    IoError(io::Error),
    ParseError(String),
    MissingField(String),
    InvalidLength { expected: usize, found: usize },
    BatchMismatch { targets: usize, guesses: usize },
}

impl std::fmt::Display for PandaError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            PandaError::IoError(ref err) =>
                write!(f, "IO Error: {}", err),
            PandaError::ParseError(ref msg) =>
                write!(f, "Parse Error: {}", msg),
            PandaError::MissingField(ref field) =>
                write!(f, "Missing Field: {}", field),
            PandaError::InvalidLength { expected, found } =>
                write!(f, "Invalid Length: expected {}, found {}", expected, found),
            PandaError::BatchMismatch { targets, guesses } =>
                write!(f, "Batch Mismatch: {} targets but {} initial guesses", targets, guesses),
        }
    }
}

impl std::error::Error for PandaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PandaError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PandaError {
    fn from(err: io::Error) -> Self {
        PandaError::IoError(err)
    }
}
