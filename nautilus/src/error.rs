//! Error types for a binning run

use nautilus_binning::BinningError;
use nautilus_io::IoError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum RunError {
    /// A run parameter is missing or out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The JSON configuration file could not be read or parsed
    #[error("cannot load config '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// An output file exists and clobbering is off
    #[error("output '{}' exists and clobber is off", .0.display())]
    OutputExists(PathBuf),

    /// An input file could not be read
    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    /// An output file could not be written
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    /// Output grid construction failed
    #[error(transparent)]
    Core(#[from] nautilus_core::Error),

    /// Binning setup failed
    #[error(transparent)]
    Binning(#[from] BinningError),
}

/// Result type for run operations
pub type RunResult<T> = Result<T, RunError>;
