//! Transform error types

use crate::function::Function;
use crate::shape::{CallShape, ShapeSet};
use thiserror::Error;
use xform_core::CoreError;

/// Transform errors
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

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

    #[error("Transform canceled")]
    Canceled,

    #[error("Series error: {0}")]
    Series(#[from] CoreError),
}

impl TransformError {
    /// Error for a call shape the transform does not declare
    pub fn unsupported_shape(function: Function, attempted: CallShape, supported: ShapeSet) -> Self {
        TransformError::UnsupportedShape {
            function,
            attempted,
            supported,
        }
    }
}

/// Result type for transform operations
pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_shape_names_required_shape() {
        let err = TransformError::unsupported_shape(
            Function::Exclude,
            CallShape::MultiList,
            ShapeSet::WITH_CONSTANTS,
        );
        assert_eq!(
            err.to_string(),
            "EXCLUDE does not support call shape EXCLUDE(expr, expr...); use EXCLUDE(expr, constant...)"
        );
    }

    #[test]
    fn test_argument_errors_carry_position() {
        let err = TransformError::InvalidArgument {
            function: Function::Include,
            index: 1,
            reason: "unclosed group".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "INCLUDE: invalid argument at constant index 1: unclosed group"
        );
    }
}
