//! Series backend contract and an in-memory implementation
//!
//! The evaluator resolves every leaf through a [`SeriesBackend`]. The backend
//! owns time filtering: transforms never re-filter by range.

use crate::ast::FetchExpr;
use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;
use xform_core::{Metric, MetricList, TimeRange};

/// Backend errors, forwarded unchanged inside `QueryError::BackendFailure`
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid leaf: {0}")]
    InvalidLeaf(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Source of raw series for leaf expressions
#[async_trait]
pub trait SeriesBackend: Send + Sync {
    /// Fetch every series matching `leaf`, restricted to `range`
    async fn fetch(
        &self,
        leaf: &FetchExpr,
        range: &TimeRange,
    ) -> std::result::Result<MetricList, BackendError>;
}

/// Compiled form of one leaf pattern field
struct ValuePattern(Option<Regex>);

impl ValuePattern {
    /// `*` matches any run of characters, `|` separates alternatives
    fn compile(pattern: &str) -> std::result::Result<Self, BackendError> {
        if pattern == "*" {
            return Ok(Self(None));
        }

        let alternatives: Vec<String> = pattern
            .split('|')
            .map(|alt| {
                alt.split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*")
            })
            .collect();
        let regex = Regex::new(&format!("^(?:{})$", alternatives.join("|")))
            .map_err(|e| BackendError::InvalidLeaf(format!("{}: {}", pattern, e)))?;
        Ok(Self(Some(regex)))
    }

    fn matches(&self, value: &str) -> bool {
        match &self.0 {
            None => true,
            Some(regex) => regex.is_match(value),
        }
    }
}

/// A leaf compiled for matching against stored series
struct LeafMatcher {
    namespace: Option<ValuePattern>,
    scope: ValuePattern,
    metric: ValuePattern,
    tags: Vec<(String, ValuePattern)>,
}

impl LeafMatcher {
    fn compile(leaf: &FetchExpr) -> std::result::Result<Self, BackendError> {
        Ok(Self {
            namespace: leaf
                .namespace_pattern()
                .map(ValuePattern::compile)
                .transpose()?,
            scope: ValuePattern::compile(leaf.scope())?,
            metric: ValuePattern::compile(leaf.metric())?,
            tags: leaf
                .tags()
                .iter()
                .map(|(k, v)| Ok((k.clone(), ValuePattern::compile(v)?)))
                .collect::<std::result::Result<_, BackendError>>()?,
        })
    }

    fn matches(&self, metric: &Metric) -> bool {
        if let Some(namespace) = &self.namespace {
            match metric.namespace() {
                Some(ns) if namespace.matches(ns) => {}
                _ => return false,
            }
        }

        self.scope.matches(metric.scope())
            && self.metric.matches(metric.metric())
            && self
                .tags
                .iter()
                .all(|(key, pattern)| metric.tag(key).is_some_and(|v| pattern.matches(v)))
    }
}

/// In-memory series store
pub struct InMemoryBackend {
    series: RwLock<Vec<Arc<Metric>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            series: RwLock::new(Vec::new()),
        }
    }

    /// Backend preloaded with `metrics`
    pub fn from_metrics(metrics: impl IntoIterator<Item = Metric>) -> Self {
        Self {
            series: RwLock::new(metrics.into_iter().map(Arc::new).collect()),
        }
    }

    /// Store a series
    pub fn insert(&self, metric: Metric) {
        self.series.write().push(Arc::new(metric));
    }

    /// Number of stored series
    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeriesBackend for InMemoryBackend {
    async fn fetch(
        &self,
        leaf: &FetchExpr,
        range: &TimeRange,
    ) -> std::result::Result<MetricList, BackendError> {
        let matcher = LeafMatcher::compile(leaf)?;

        let series = self.series.read();
        let result: MetricList = series
            .iter()
            .filter(|m| matcher.matches(m))
            .map(|m| Arc::new(m.slice(range)))
            .collect();

        trace!(leaf = %leaf, stored = series.len(), matched = result.len(), "In-memory fetch");
        Ok(result)
    }
}
