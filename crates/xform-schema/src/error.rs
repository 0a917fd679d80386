//! Schema error types

use thiserror::Error;

/// Schema errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(String),
}

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;
