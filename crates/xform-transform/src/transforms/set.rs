//! Identity-keyed set operations over metric lists

use crate::context::QueryContext;
use crate::error::{Result, TransformError};
use crate::function::Function;
use crate::shape::{ShapeSet, TransformArgs};
use crate::transform::Transform;
use std::collections::HashSet;
use std::sync::Arc;
use xform_core::{Metric, MetricIdentity, MetricList};

/// Metrics of `metrics` whose identity does not appear in `removed`.
///
/// Order is preserved. Payloads are never compared, so `removed` may hold
/// freshly built instances of the same series.
pub fn difference(metrics: &[Arc<Metric>], removed: &[Arc<Metric>]) -> MetricList {
    if removed.is_empty() {
        return metrics.to_vec();
    }

    let removed: HashSet<&MetricIdentity> = removed.iter().map(|m| m.identity()).collect();
    metrics
        .iter()
        .filter(|m| !removed.contains(m.identity()))
        .cloned()
        .collect()
}

/// Concatenation of `lists` keeping the first occurrence of each identity
pub fn union<'a>(lists: impl IntoIterator<Item = &'a [Arc<Metric>]>) -> MetricList {
    let mut seen: HashSet<&MetricIdentity> = HashSet::new();
    let mut output = Vec::new();

    for list in lists {
        for metric in list {
            if seen.insert(metric.identity()) {
                output.push(Arc::clone(metric));
            }
        }
    }
    output
}

/// UNION(expr, expr...)
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionTransform;

impl Transform for UnionTransform {
    fn function(&self) -> Function {
        Function::Union
    }

    fn shapes(&self) -> ShapeSet {
        ShapeSet::PLAIN | ShapeSet::MULTI_LIST
    }

    fn apply(&self, ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList> {
        match args {
            TransformArgs::Plain(metrics) => Ok(union([metrics])),
            TransformArgs::MultiList(lists) => {
                ctx.check_cancelled()?;
                Ok(union(lists.iter().copied()))
            }
            other => Err(TransformError::unsupported_shape(
                self.function(),
                other.shape(),
                self.shapes(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xform_core::TimeRange;

    fn metric(name: &str, value: f64) -> Arc<Metric> {
        Arc::new(
            Metric::builder("host1", name)
                .datapoint(1000, value)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_difference_by_identity() {
        let input = vec![metric("a", 1.0), metric("b", 2.0), metric("c", 3.0)];
        // Same identity as "b", different payload and instance
        let removed = vec![metric("b", 99.0), metric("zzz", 0.0)];

        let output = difference(&input, &removed);
        let names: Vec<&str> = output.iter().map(|m| m.metric()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_difference_of_nothing() {
        let input = vec![metric("a", 1.0)];
        assert_eq!(difference(&input, &[]).len(), 1);
        assert!(difference(&[], &input).is_empty());
    }

    #[test]
    fn test_union_keeps_first_occurrence() {
        let first = vec![metric("a", 1.0), metric("b", 2.0)];
        let second = vec![metric("b", 20.0), metric("c", 3.0)];
        let lists = [first.as_slice(), second.as_slice()];

        let output = UnionTransform
            .apply(
                &QueryContext::new(TimeRange::new(0, 10_000)),
                TransformArgs::MultiList(&lists),
            )
            .unwrap();

        let names: Vec<&str> = output.iter().map(|m| m.metric()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(output[1].datapoints().get(&1000), Some(&2.0));
    }

    #[test]
    fn test_union_plain_deduplicates() {
        let input = vec![metric("a", 1.0), metric("a", 5.0)];
        let output = UnionTransform
            .apply(
                &QueryContext::new(TimeRange::new(0, 10_000)),
                TransformArgs::Plain(&input),
            )
            .unwrap();
        assert_eq!(output.len(), 1);
    }
}
