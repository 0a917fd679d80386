//! Closed enumeration of transform function names

use crate::error::{Result, TransformError};
use std::fmt;
use std::str::FromStr;

/// Functions that may appear in an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Function {
    /// Keep series whose identity matches any regex
    Include,
    /// Drop series whose identity matches any regex
    Exclude,
    /// Concatenate lists, first occurrence of each identity wins
    Union,
    /// Return the input unchanged
    Identity,
    /// Absolute value of every datapoint
    Absolute,
    /// Multiply every datapoint by a constant
    Scale,
    /// Point-wise sum across series
    Sum,
    /// Point-wise mean across series
    Average,
    /// Point-wise minimum across series
    Min,
    /// Point-wise maximum across series
    Max,
    /// Point-wise count of values across series
    Count,
}

impl Function {
    /// Every function, in declaration order
    pub const ALL: [Function; 11] = [
        Function::Include,
        Function::Exclude,
        Function::Union,
        Function::Identity,
        Function::Absolute,
        Function::Scale,
        Function::Sum,
        Function::Average,
        Function::Min,
        Function::Max,
        Function::Count,
    ];

    /// Canonical upper-case name, also used as the result scope name
    pub fn name(&self) -> &'static str {
        match self {
            Function::Include => "INCLUDE",
            Function::Exclude => "EXCLUDE",
            Function::Union => "UNION",
            Function::Identity => "IDENTITY",
            Function::Absolute => "ABSOLUTE",
            Function::Scale => "SCALE",
            Function::Sum => "SUM",
            Function::Average => "AVERAGE",
            Function::Min => "MIN",
            Function::Max => "MAX",
            Function::Count => "COUNT",
        }
    }
}

impl FromStr for Function {
    type Err = TransformError;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        let s_upper = s.to_ascii_uppercase();
        match s_upper.as_str() {
            "INCLUDE" => Ok(Function::Include),
            "EXCLUDE" => Ok(Function::Exclude),
            "UNION" => Ok(Function::Union),
            "IDENTITY" => Ok(Function::Identity),
            "ABSOLUTE" | "ABS" => Ok(Function::Absolute),
            "SCALE" => Ok(Function::Scale),
            "SUM" => Ok(Function::Sum),
            "AVERAGE" | "AVG" => Ok(Function::Average),
            "MIN" => Ok(Function::Min),
            "MAX" => Ok(Function::Max),
            "COUNT" => Ok(Function::Count),
            _ => Err(TransformError::UnknownFunction(s.to_string())),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
