//! Batch error types

use thiserror::Error;

/// Errors raised while building, executing or decoding a batch script
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Variable name '{0}' contains invalid character(s)")]
    InvalidName(String),

    #[error("No batch variable named '{0}'")]
    VariableNotFound(String),

    #[error("No registered class named '{0}'")]
    UnknownClass(String),

    /// Conventional signal for aborting a branch body; converted to a
    /// ROLLBACK statement at the branch boundary.
    #[error("Batch rolled back")]
    Rollback,

    #[error("Script execution error: {0}")]
    Execution(String),

    #[error("Materialization error: {0}")]
    Materialize(String),

    #[error("Response decode error: {0}")]
    Decode(String),
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, BatchError>;
