//! Xform Schema - Schema discovery records and their search-index wire format
//!
//! This crate provides:
//! - `MetricSchemaRecord`: one (namespace, scope, metric, tag key, tag value) entry
//! - `HashAlgorithm`: content hashing used for idempotent document ids
//! - `SchemaRecordBatch`: de-duplicated records serialized as a bulk index request
//! - `SchemaRecordPage`: records read back from a search response, with a scroll cursor

pub mod batch;
pub mod error;
pub mod hash;
pub mod record;
pub mod response;

pub use batch::SchemaRecordBatch;
pub use error::{Result, SchemaError};
pub use hash::HashAlgorithm;
pub use record::{MetricSchemaRecord, DEFAULT_RETENTION_DISCOVERY_DAYS};
pub use response::{ScrollCursor, SchemaRecordPage};
