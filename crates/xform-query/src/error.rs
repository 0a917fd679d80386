//! Query error types

use crate::backend::BackendError;
use std::fmt;
use thiserror::Error;
use xform_core::CoreError;
use xform_transform::{CallShape, Function, ShapeSet, TransformError};

/// Why an evaluation stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled the request token
    Requested,
    /// The configured query timeout elapsed
    Timeout,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => f.write_str("cancelled by caller"),
            CancelReason::Timeout => f.write_str("timeout exceeded"),
        }
    }
}

/// Coarse error category for programmatic matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownFunction,
    UnsupportedShape,
    MissingArgument,
    InvalidArgument,
    BackendFailure,
    Canceled,
    Parse,
    InvalidTimeRange,
    InvalidSeries,
}

/// Query errors
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown function '{name}' at position {position}")]
    UnknownFunction { name: String, position: usize },

    #[error(
        "{function} does not support call shape {function}{attempted}; use {required}",
        required = .supported.describe(*.function)
    )]
    UnsupportedShape {
        function: Function,
        attempted: CallShape,
        supported: ShapeSet,
    },

    #[error("{function}: missing required argument at constant index {index}")]
    MissingArgument { function: Function, index: usize },

    #[error("{function}: invalid argument at constant index {index}: {reason}")]
    InvalidArgument {
        function: Function,
        index: usize,
        reason: String,
    },

    #[error("Backend failure fetching '{leaf}': {source}")]
    BackendFailure {
        leaf: String,
        #[source]
        source: BackendError,
    },

    #[error("Query canceled: {0}")]
    Canceled(CancelReason),

    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Invalid time range: start {start} >= end {end}")]
    InvalidTimeRange { start: i64, end: i64 },

    #[error("Invalid series: {0}")]
    InvalidSeries(String),
}

impl QueryError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            QueryError::UnsupportedShape { .. } => ErrorKind::UnsupportedShape,
            QueryError::MissingArgument { .. } => ErrorKind::MissingArgument,
            QueryError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            QueryError::BackendFailure { .. } => ErrorKind::BackendFailure,
            QueryError::Canceled(_) => ErrorKind::Canceled,
            QueryError::Parse { .. } => ErrorKind::Parse,
            QueryError::InvalidTimeRange { .. } => ErrorKind::InvalidTimeRange,
            QueryError::InvalidSeries(_) => ErrorKind::InvalidSeries,
        }
    }

    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        QueryError::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

impl From<TransformError> for QueryError {
    fn from(e: TransformError) -> Self {
        match e {
            // Only reachable for programmatically built expressions
            TransformError::UnknownFunction(name) => QueryError::UnknownFunction { name, position: 0 },
            TransformError::UnsupportedShape {
                function,
                attempted,
                supported,
            } => QueryError::UnsupportedShape {
                function,
                attempted,
                supported,
            },
            TransformError::MissingArgument { function, index } => {
                QueryError::MissingArgument { function, index }
            }
            TransformError::InvalidArgument {
                function,
                index,
                reason,
            } => QueryError::InvalidArgument {
                function,
                index,
                reason,
            },
            TransformError::Canceled => QueryError::Canceled(CancelReason::Requested),
            TransformError::Series(e) => e.into(),
        }
    }
}

impl From<CoreError> for QueryError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidTimeRange { start, end } => QueryError::InvalidTimeRange { start, end },
            other => QueryError::InvalidSeries(other.to_string()),
        }
    }
}
