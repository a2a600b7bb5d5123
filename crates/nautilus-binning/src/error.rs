//! Error types for nautilus-binning

use thiserror::Error;

/// Errors that can occur while setting up or running a binning pass
#[derive(Debug, Error)]
pub enum BinningError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] nautilus_core::Error),

    /// SNR threshold is NaN, zero or negative
    #[error("invalid SNR threshold {0}: must be positive")]
    InvalidThreshold(f64),

    /// Split policy selector outside 0..=4
    #[error("invalid split policy {0}: expected 0-4")]
    InvalidPolicy(i64),

    /// Split policy name not recognised
    #[error("unknown split policy '{0}'")]
    UnknownPolicy(String),

    /// An auxiliary grid does not match the value grid
    #[error("{what} is {actual:?} but the image is {expected:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Result type for binning operations
pub type BinningResult<T> = Result<T, BinningError>;
