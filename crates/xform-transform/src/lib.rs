//! Xform Transform - Transform contract and catalog
//!
//! This crate provides:
//! - The `Transform` trait and its three call shapes
//! - `QueryContext`, the per-request state handed to every transform
//! - `TransformCatalog`, the immutable function registry and dispatch point
//! - Built-in transforms (INCLUDE, EXCLUDE, UNION, reducers, value mappers)

pub mod aggregation;
pub mod catalog;
pub mod context;
pub mod error;
pub mod function;
pub mod shape;
pub mod transform;
pub mod transforms;

pub use aggregation::{AggregateFunction, Aggregator};
pub use catalog::TransformCatalog;
pub use context::QueryContext;
pub use error::{Result, TransformError};
pub use function::Function;
pub use shape::{CallShape, ShapeSet, TransformArgs};
pub use transform::Transform;
