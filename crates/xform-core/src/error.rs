//! Error types for xform-core

use thiserror::Error;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Empty scope")]
    EmptyScope,

    #[error("Empty metric name")]
    EmptyMetricName,

    #[error("Empty tag key")]
    EmptyTagKey,

    #[error("Duplicate tag key: {0}")]
    DuplicateTagKey(String),

    #[error("Invalid time range: start {start} >= end {end}")]
    InvalidTimeRange { start: i64, end: i64 },
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
