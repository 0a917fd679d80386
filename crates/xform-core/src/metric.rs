//! Metric entity
//!
//! A `Metric` pairs an immutable `MetricIdentity` with an ordered payload of
//! datapoints. Transforms never mutate a metric; they build a new one (see
//! [`Metric::with_datapoints`]) and hand it out behind an `Arc`.

use crate::error::{CoreError, Result};
use crate::types::{TimeRange, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared, read-only list of metrics exchanged between transforms
pub type MetricList = Vec<Arc<Metric>>;

/// Identity of a series: namespace, scope, metric name and tag set.
///
/// Equality and hashing cover exactly these fields, so an identity can be used
/// as a set key regardless of the datapoints a metric currently carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricIdentity {
    namespace: Option<String>,
    scope: String,
    metric: String,
    tags: BTreeMap<String, String>,
}

impl MetricIdentity {
    /// Create and validate an identity
    pub fn new(
        namespace: Option<String>,
        scope: impl Into<String>,
        metric: impl Into<String>,
        tags: BTreeMap<String, String>,
    ) -> Result<Self> {
        let scope = scope.into();
        let metric = metric.into();

        if scope.is_empty() {
            return Err(CoreError::EmptyScope);
        }
        if metric.is_empty() {
            return Err(CoreError::EmptyMetricName);
        }
        if tags.keys().any(|k| k.is_empty()) {
            return Err(CoreError::EmptyTagKey);
        }

        Ok(Self {
            namespace,
            scope,
            metric,
            tags,
        })
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Tags sorted by key
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Get a tag value by key
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Deterministic textual form: `namespace:scope:metric{k1=v1,k2=v2}`.
    ///
    /// The `namespace:` prefix is omitted when no namespace is set and the tag
    /// block is omitted when there are no tags.
    pub fn canonical_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}:", namespace)?;
        }
        write!(f, "{}:{}", self.scope, self.metric)?;

        if !self.tags.is_empty() {
            f.write_str("{")?;
            for (i, (k, v)) in self.tags.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

/// A time series: identity, optional display metadata and datapoints.
///
/// Datapoints are kept in a `BTreeMap`, so they are always in ascending
/// timestamp order no matter how they were supplied. A later value for a
/// duplicate timestamp replaces the earlier one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "MetricRecord", into = "MetricRecord")]
pub struct Metric {
    identity: MetricIdentity,
    units: Option<String>,
    display_name: Option<String>,
    datapoints: BTreeMap<Timestamp, f64>,
}

impl Metric {
    /// Create a new metric builder
    pub fn builder(scope: impl Into<String>, metric: impl Into<String>) -> MetricBuilder {
        MetricBuilder::new(scope, metric)
    }

    /// Create a metric from an identity and datapoints
    pub fn new(
        identity: MetricIdentity,
        datapoints: impl IntoIterator<Item = (Timestamp, f64)>,
    ) -> Self {
        Self {
            identity,
            units: None,
            display_name: None,
            datapoints: datapoints.into_iter().collect(),
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }

    pub fn namespace(&self) -> Option<&str> {
        self.identity.namespace()
    }

    pub fn scope(&self) -> &str {
        self.identity.scope()
    }

    pub fn metric(&self) -> &str {
        self.identity.metric()
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        self.identity.tags()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.identity.tag(key)
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Datapoints in ascending timestamp order
    pub fn datapoints(&self) -> &BTreeMap<Timestamp, f64> {
        &self.datapoints
    }

    /// Number of datapoints
    pub fn len(&self) -> usize {
        self.datapoints.len()
    }

    /// Check if the metric has no datapoints
    pub fn is_empty(&self) -> bool {
        self.datapoints.is_empty()
    }

    /// New metric with the same identity and metadata but a replaced payload
    pub fn with_datapoints(&self, datapoints: impl IntoIterator<Item = (Timestamp, f64)>) -> Metric {
        Metric {
            identity: self.identity.clone(),
            units: self.units.clone(),
            display_name: self.display_name.clone(),
            datapoints: datapoints.into_iter().collect(),
        }
    }

    /// New metric with `f` applied to every value
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Metric {
        self.with_datapoints(self.datapoints.iter().map(|(&ts, &v)| (ts, f(v))))
    }

    /// New metric restricted to datapoints inside `range`
    pub fn slice(&self, range: &TimeRange) -> Metric {
        self.with_datapoints(
            self.datapoints
                .range(range.start..range.end)
                .map(|(&ts, &v)| (ts, v)),
        )
    }
}

/// Builder for constructing Metrics
pub struct MetricBuilder {
    namespace: Option<String>,
    scope: String,
    metric: String,
    tags: Vec<(String, String)>,
    units: Option<String>,
    display_name: Option<String>,
    datapoints: Vec<(Timestamp, f64)>,
}

impl MetricBuilder {
    /// Create a new metric builder
    pub fn new(scope: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            namespace: None,
            scope: scope.into(),
            metric: metric.into(),
            tags: Vec::new(),
            units: None,
            display_name: None,
            datapoints: Vec::new(),
        }
    }

    /// Set the namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Set the units
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Set the display name
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Add a datapoint
    pub fn datapoint(mut self, ts: Timestamp, value: f64) -> Self {
        self.datapoints.push((ts, value));
        self
    }

    /// Add several datapoints
    pub fn datapoints(mut self, points: impl IntoIterator<Item = (Timestamp, f64)>) -> Self {
        self.datapoints.extend(points);
        self
    }

    /// Build the metric
    pub fn build(self) -> Result<Metric> {
        let mut tags = BTreeMap::new();
        for (key, value) in self.tags {
            if tags.contains_key(&key) {
                return Err(CoreError::DuplicateTagKey(key));
            }
            tags.insert(key, value);
        }

        let identity = MetricIdentity::new(self.namespace, self.scope, self.metric, tags)?;

        Ok(Metric {
            identity,
            units: self.units,
            display_name: self.display_name,
            datapoints: self.datapoints.into_iter().collect(),
        })
    }
}

/// Wire form of a [`Metric`], used for JSON input and output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub scope: String,
    pub metric: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub datapoints: BTreeMap<Timestamp, f64>,
}

impl TryFrom<MetricRecord> for Metric {
    type Error = CoreError;

    fn try_from(record: MetricRecord) -> Result<Self> {
        let identity =
            MetricIdentity::new(record.namespace, record.scope, record.metric, record.tags)?;
        Ok(Metric {
            identity,
            units: record.units,
            display_name: record.display_name,
            datapoints: record.datapoints,
        })
    }
}

impl From<Metric> for MetricRecord {
    fn from(metric: Metric) -> Self {
        MetricRecord {
            namespace: metric.identity.namespace,
            scope: metric.identity.scope,
            metric: metric.identity.metric,
            tags: metric.identity.tags,
            units: metric.units,
            display_name: metric.display_name,
            datapoints: metric.datapoints,
        }
    }
}
