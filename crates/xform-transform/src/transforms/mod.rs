//! Built-in transforms
//!
//! - `filter`: INCLUDE / EXCLUDE by regex over the canonical identity
//! - `set`: UNION and identity-keyed set helpers
//! - `map`: IDENTITY, ABSOLUTE, SCALE
//! - `reduce`: point-wise reducers (SUM, AVERAGE, MIN, MAX, COUNT)

mod filter;
mod map;
mod reduce;
mod set;

pub use filter::{ExcludeTransform, IncludeTransform};
pub use map::{AbsoluteTransform, IdentityTransform, ScaleTransform};
pub use reduce::ReduceTransform;
pub use set::{difference, union, UnionTransform};
