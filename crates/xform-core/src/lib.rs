//! Xform Core - Core types for the metric transform engine
//!
//! This crate provides the fundamental data types shared by every other crate:
//! - `Timestamp`: Millisecond-precision Unix epoch timestamps
//! - `TimeRange`: Half-open query window
//! - `MetricIdentity`: namespace + scope + metric name + tag set
//! - `Metric`: A series with an immutable identity and an ordered payload
//! - `MetricList`: Shared, read-only list of metrics passed between transforms

pub mod error;
pub mod metric;
pub mod types;

pub use error::{CoreError, Result};
pub use metric::{Metric, MetricBuilder, MetricIdentity, MetricList, MetricRecord};
pub use types::*;
