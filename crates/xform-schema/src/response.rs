//! Search response deserialization
//!
//! The read path turns one page of a scrolled search into records plus an
//! explicit [`ScrollCursor`]. No scroll state is kept here: the caller passes
//! the cursor back to fetch the next page.

use crate::error::Result;
use crate::record::MetricSchemaRecord;
use serde::Deserialize;
use std::fmt;

/// Opaque cursor for the next page of a scrolled search
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrollCursor(String);

impl ScrollCursor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScrollCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,
    hits: Hits,
}

#[derive(Deserialize)]
struct Hits {
    total: TotalHits,
    #[serde(default)]
    hits: Vec<Hit>,
}

/// `hits.total` is a plain number in older responses and an object in newer ones
#[derive(Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Object { value } => *value,
        }
    }
}

#[derive(Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: MetricSchemaRecord,
}

/// One page of schema records from a search response
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRecordPage {
    pub records: Vec<MetricSchemaRecord>,
    pub scroll_id: Option<ScrollCursor>,
    pub total_hits: u64,
}

impl SchemaRecordPage {
    /// Parse a search response body
    pub fn from_json(body: &str) -> Result<Self> {
        let response: SearchResponse = serde_json::from_str(body)?;
        Ok(Self {
            records: response.hits.hits.into_iter().map(|h| h.source).collect(),
            scroll_id: response.scroll_id.map(ScrollCursor),
            total_hits: response.hits.total.value(),
        })
    }

    /// Check whether more pages may follow this one
    pub fn has_more(&self) -> bool {
        self.scroll_id.is_some() && !self.records.is_empty()
    }
}
