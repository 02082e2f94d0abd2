//! Error taxonomy for store, predictor and service operations

use thiserror::Error;

/// Errors surfaced by the salary service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing numeric input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Delete referenced an unknown observation id
    #[error("Data not found: no observation with id {0}")]
    NotFound(i64),

    /// Predict was called while the model is untrained
    #[error("No Data! Please train me.")]
    ModelNotTrained,

    /// SQLite failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
