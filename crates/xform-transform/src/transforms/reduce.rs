//! Point-wise reducers
//!
//! All input series are folded by timestamp into a single series. The result
//! identity is synthesized from the inputs:
//! - scope: the transform's result scope name (e.g. `SUM`)
//! - metric: the common metric name, or `result` when inputs disagree
//! - namespace: the common namespace, if any
//! - tags: the key/value pairs shared by every input

use crate::aggregation::{AggregateFunction, Aggregator};
use crate::context::QueryContext;
use crate::error::{Result, TransformError};
use crate::function::Function;
use crate::shape::{ShapeSet, TransformArgs};
use crate::transform::Transform;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;
use xform_core::{Metric, MetricIdentity, MetricList, Timestamp};

/// Metric name used when the reduced inputs have different names
pub const MIXED_METRIC_NAME: &str = "result";

/// SUM / AVERAGE / MIN / MAX / COUNT over one list
#[derive(Debug, Clone, Copy)]
pub struct ReduceTransform {
    function: Function,
    aggregate: AggregateFunction,
}

impl ReduceTransform {
    pub fn new(function: Function, aggregate: AggregateFunction) -> Self {
        Self {
            function,
            aggregate,
        }
    }

    pub fn aggregate(&self) -> AggregateFunction {
        self.aggregate
    }

    fn reduce(&self, ctx: &QueryContext, metrics: &[Arc<Metric>]) -> Result<MetricList> {
        let Some((first, rest)) = metrics.split_first() else {
            return Ok(Vec::new());
        };

        let mut buckets: BTreeMap<Timestamp, Aggregator> = BTreeMap::new();
        for metric in metrics {
            ctx.check_cancelled()?;
            for (&ts, &value) in metric.datapoints() {
                buckets
                    .entry(ts)
                    .or_insert_with(|| Aggregator::new(self.aggregate))
                    .add(value);
            }
        }

        let name = if rest.iter().all(|m| m.metric() == first.metric()) {
            first.metric()
        } else {
            MIXED_METRIC_NAME
        };

        let namespace = first
            .namespace()
            .filter(|ns| rest.iter().all(|m| m.namespace() == Some(*ns)))
            .map(str::to_string);

        let tags: BTreeMap<String, String> = first
            .tags()
            .iter()
            .filter(|(k, v)| rest.iter().all(|m| m.tag(k) == Some(v.as_str())))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let identity = MetricIdentity::new(namespace, self.result_scope_name(), name, tags)?;
        let datapoints = buckets
            .into_iter()
            .filter_map(|(ts, agg)| agg.result().map(|v| (ts, v)));

        let reduced = Metric::new(identity, datapoints);
        trace!(
            function = self.function.name(),
            inputs = metrics.len(),
            points = reduced.len(),
            "Reduced series"
        );
        Ok(vec![Arc::new(reduced)])
    }
}

impl Transform for ReduceTransform {
    fn function(&self) -> Function {
        self.function
    }

    fn shapes(&self) -> ShapeSet {
        ShapeSet::PLAIN
    }

    fn apply(&self, ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList> {
        match args {
            TransformArgs::Plain(metrics) => self.reduce(ctx, metrics),
            other => Err(TransformError::unsupported_shape(
                self.function(),
                other.shape(),
                self.shapes(),
            )),
        }
    }
}
