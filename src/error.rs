//! Error types.

use thiserror::Error;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value was rejected (layer widths, split percentage, hyperparameters).
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Input data could not be used (header mismatch, unknown token, empty partition).
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Network and data dimensions do not agree.
    #[error("invalid shape: {0}")]
    InvalidShape(String),

    /// Training produced a non-finite error or weight.
    #[error("training diverged at epoch {epoch}, step {step}")]
    Diverged { epoch: usize, step: usize },

    /// The operation needs exclusive access but a training worker is active.
    #[error("training is running")]
    Running,

    /// The operation is not available in the current session state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "serde")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
