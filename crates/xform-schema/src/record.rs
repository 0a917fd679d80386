//! Schema discovery record

use serde::{Deserialize, Serialize};
use xform_core::Metric;

/// Retention applied when a record does not carry its own
pub const DEFAULT_RETENTION_DISCOVERY_DAYS: u32 = 45;

/// One discoverable (namespace, scope, metric, tag key, tag value) entry.
///
/// Every field is optional on the wire; an absent field is distinct from an
/// empty string and is omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricSchemaRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagv: Option<String>,
    #[serde(
        rename = "_retention_discovery_",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub retention_discovery: Option<u32>,
}

impl MetricSchemaRecord {
    /// Record for `scope:metric` without namespace or tag
    pub fn new(scope: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            metric: Some(metric.into()),
            ..Default::default()
        }
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the tag key and value
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tagk = Some(key.into());
        self.tagv = Some(value.into());
        self
    }

    /// Set the retention in days
    pub fn with_retention(mut self, days: u32) -> Self {
        self.retention_discovery = Some(days);
        self
    }

    /// Records describing `metric`: one per tag, or a single tagless record
    pub fn from_metric(metric: &Metric) -> Vec<MetricSchemaRecord> {
        let base = MetricSchemaRecord {
            namespace: metric.namespace().map(str::to_string),
            ..MetricSchemaRecord::new(metric.scope(), metric.metric())
        };

        if metric.tags().is_empty() {
            return vec![base];
        }

        metric
            .tags()
            .iter()
            .map(|(k, v)| base.clone().with_tag(k.as_str(), v.as_str()))
            .collect()
    }

    /// Retention in days, falling back to the default
    pub fn retention_days(&self) -> u32 {
        self.retention_discovery
            .unwrap_or(DEFAULT_RETENTION_DISCOVERY_DAYS)
    }

    /// Canonical print: the JSON array `[namespace, scope, metric, tagk, tagv]`
    /// with `null` for unset fields. Quoting keeps field boundaries and
    /// absent fields distinct from any string value. Retention is not part of
    /// the print, so changing it updates the same document.
    pub fn print(&self) -> String {
        serde_json::json!([
            self.namespace,
            self.scope,
            self.metric,
            self.tagk,
            self.tagv
        ])
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print() {
        let record = MetricSchemaRecord::new("host1", "cpu.load")
            .with_tag("dc", "sfo")
            .with_retention(10);
        assert_eq!(record.print(), r#"[null,"host1","cpu.load","dc","sfo"]"#);

        let record = MetricSchemaRecord::new("host1", "cpu.load").with_namespace("infra");
        assert_eq!(record.print(), r#"["infra","host1","cpu.load",null,null]"#);
    }

    #[test]
    fn test_print_keeps_distinct_records_apart() {
        let pairs = [
            (
                MetricSchemaRecord::new("a:b", "c"),
                MetricSchemaRecord::new("a", "b:c"),
            ),
            (
                MetricSchemaRecord::new("host1", "cpu").with_namespace("null"),
                MetricSchemaRecord::new("host1", "cpu"),
            ),
            (
                MetricSchemaRecord::new("host1", "cpu").with_tag("", ""),
                MetricSchemaRecord::new("host1", "cpu"),
            ),
        ];
        for (left, right) in &pairs {
            assert_ne!(left.print(), right.print(), "{:?} vs {:?}", left, right);
        }
    }

    #[test]
    fn test_from_metric() {
        let metric = Metric::builder("host1", "cpu.load")
            .namespace("infra")
            .tag("dc", "sfo")
            .tag("env", "prod")
            .build()
            .unwrap();
        let records = MetricSchemaRecord::from_metric(&metric);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tagk.as_deref(), Some("dc"));
        assert_eq!(records[1].tagv.as_deref(), Some("prod"));
        assert!(records.iter().all(|r| r.namespace.as_deref() == Some("infra")));

        let untagged = Metric::builder("host1", "mem").build().unwrap();
        let records = MetricSchemaRecord::from_metric(&untagged);
        assert_eq!(records, vec![MetricSchemaRecord::new("host1", "mem")]);
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let record = MetricSchemaRecord::new("host1", "cpu").with_retention(7);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"scope":"host1","metric":"cpu","_retention_discovery_":7}"#
        );

        // Empty string is kept, absent is not
        let record: MetricSchemaRecord =
            serde_json::from_str(r#"{"scope":"","metric":"cpu"}"#).unwrap();
        assert_eq!(record.scope.as_deref(), Some(""));
        assert_eq!(record.namespace, None);
        assert_eq!(record.retention_days(), DEFAULT_RETENTION_DISCOVERY_DAYS);
    }
}
