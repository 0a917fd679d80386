//! Bulk index serialization
//!
//! A batch renders as newline-delimited action/document pairs:
//!
//! ```text
//! {"index":{"_id":"<hash>"}}
//! {<record fields>,"mts":<now>,"cts":<now>,"expirationTs":<now + retention days>}
//! ```

use crate::error::Result;
use crate::hash::HashAlgorithm;
use crate::record::{MetricSchemaRecord, DEFAULT_RETENTION_DISCOVERY_DAYS};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use xform_core::{now_millis, Timestamp, MILLIS_PER_DAY};

#[derive(Serialize)]
struct BulkAction<'a> {
    index: ActionMeta<'a>,
}

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
}

#[derive(Serialize)]
struct IndexDocument<'a> {
    #[serde(flatten)]
    record: &'a MetricSchemaRecord,
    mts: Timestamp,
    cts: Timestamp,
    #[serde(rename = "expirationTs")]
    expiration_ts: Timestamp,
}

/// Records keyed by their content-hash id; duplicates collapse on insert
#[derive(Debug, Clone)]
pub struct SchemaRecordBatch {
    records: BTreeMap<String, MetricSchemaRecord>,
    algorithm: HashAlgorithm,
    default_retention_days: u32,
}

impl SchemaRecordBatch {
    /// Empty batch hashing ids with `algorithm`
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            records: BTreeMap::new(),
            algorithm,
            default_retention_days: DEFAULT_RETENTION_DISCOVERY_DAYS,
        }
    }

    /// Batch holding `records`
    pub fn from_records(
        records: impl IntoIterator<Item = MetricSchemaRecord>,
        algorithm: HashAlgorithm,
    ) -> Self {
        let mut batch = Self::new(algorithm);
        batch.extend(records);
        batch
    }

    /// Retention used for records that carry none
    pub fn with_default_retention(mut self, days: u32) -> Self {
        self.default_retention_days = days;
        self
    }

    /// Insert a record and return its id
    pub fn insert(&mut self, record: MetricSchemaRecord) -> String {
        let id = self.algorithm.id(&record.print());
        self.records.insert(id.clone(), record);
        id
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = MetricSchemaRecord>) {
        for record in records {
            self.insert(record);
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn get(&self, id: &str) -> Option<&MetricSchemaRecord> {
        self.records.get(id)
    }

    /// Ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &MetricSchemaRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Expiration timestamp of `record` when indexed at `now`
    pub fn expiration_ts(&self, record: &MetricSchemaRecord, now: Timestamp) -> Timestamp {
        let days = record
            .retention_discovery
            .unwrap_or(self.default_retention_days);
        now.saturating_add(i64::from(days) * MILLIS_PER_DAY)
    }

    /// Bulk index request body with `mts`/`cts` set to `now`
    pub fn to_bulk_index(&self, now: Timestamp) -> Result<String> {
        let mut body = String::new();
        for (id, record) in &self.records {
            let action = BulkAction {
                index: ActionMeta { id },
            };
            let document = IndexDocument {
                record,
                mts: now,
                cts: now,
                expiration_ts: self.expiration_ts(record, now),
            };

            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(&document)?);
            body.push('\n');
        }

        debug!(records = self.records.len(), bytes = body.len(), "Built bulk index body");
        Ok(body)
    }

    /// Bulk index request body stamped with the current wall-clock time
    pub fn to_bulk_index_now(&self) -> Result<String> {
        self.to_bulk_index(now_millis())
    }
}
