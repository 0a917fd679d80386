//! Regex filters over the canonical identity string

use super::set::difference;
use crate::context::QueryContext;
use crate::error::{Result, TransformError};
use crate::function::Function;
use crate::shape::{ShapeSet, TransformArgs};
use crate::transform::Transform;
use regex::Regex;
use std::sync::Arc;
use tracing::trace;
use xform_core::{Metric, MetricList};

/// Compile every constant as a regex, reporting failures by constant index
fn compile_patterns(function: Function, constants: &[String]) -> Result<Vec<Regex>> {
    if constants.is_empty() {
        return Err(TransformError::MissingArgument { function, index: 0 });
    }

    constants
        .iter()
        .enumerate()
        .map(|(index, pattern)| {
            Regex::new(pattern).map_err(|e| TransformError::InvalidArgument {
                function,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Metrics whose canonical identity matches any of `constants`, in input order.
///
/// `function` only labels errors, so EXCLUDE reports its own name.
fn select(
    function: Function,
    ctx: &QueryContext,
    metrics: &[Arc<Metric>],
    constants: &[String],
) -> Result<MetricList> {
    let patterns = compile_patterns(function, constants)?;

    let mut selected = Vec::new();
    for metric in metrics {
        ctx.check_cancelled()?;

        let identity = metric.identity().canonical_string();
        if patterns.iter().any(|re| re.is_match(&identity)) {
            selected.push(Arc::clone(metric));
        }
    }

    trace!(
        function = function.name(),
        inputs = metrics.len(),
        matched = selected.len(),
        "Regex selection"
    );
    Ok(selected)
}

/// INCLUDE(expr, regex...): keep series whose identity matches any regex
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeTransform;

impl Transform for IncludeTransform {
    fn function(&self) -> Function {
        Function::Include
    }

    fn shapes(&self) -> ShapeSet {
        ShapeSet::WITH_CONSTANTS
    }

    fn apply(&self, ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList> {
        match args {
            TransformArgs::WithConstants(metrics, constants) => {
                select(Function::Include, ctx, metrics, constants)
            }
            other => Err(TransformError::unsupported_shape(
                self.function(),
                other.shape(),
                self.shapes(),
            )),
        }
    }
}

/// EXCLUDE(expr, regex...): the complement of INCLUDE with the same constants
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeTransform;

impl Transform for ExcludeTransform {
    fn function(&self) -> Function {
        Function::Exclude
    }

    fn shapes(&self) -> ShapeSet {
        ShapeSet::WITH_CONSTANTS
    }

    fn apply(&self, ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList> {
        match args {
            TransformArgs::WithConstants(metrics, constants) => {
                let matched = select(Function::Exclude, ctx, metrics, constants)?;
                Ok(difference(metrics, &matched))
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
    use crate::shape::CallShape;
    use xform_core::TimeRange;

    fn metric(scope: &str, name: &str) -> Arc<Metric> {
        Arc::new(
            Metric::builder(scope, name)
                .datapoint(1000, 1.0)
                .build()
                .unwrap(),
        )
    }

    fn names(list: &MetricList) -> Vec<&str> {
        list.iter().map(|m| m.metric()).collect()
    }

    fn ctx() -> QueryContext {
        QueryContext::new(TimeRange::new(0, 10_000))
    }

    #[test]
    fn test_include_matches_any_pattern() {
        let input = vec![
            metric("host1", "cpu.load"),
            metric("host1", "mem.used"),
            metric("host2", "disk.io"),
        ];
        let constants = vec!["mem".to_string(), "^host2:".to_string()];

        let output = IncludeTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &constants))
            .unwrap();
        assert_eq!(names(&output), vec!["mem.used", "disk.io"]);
        // Retained metrics are shared, not copied
        assert!(Arc::ptr_eq(&output[0], &input[1]));
    }

    #[test]
    fn test_include_matches_tags() {
        let tagged = Arc::new(
            Metric::builder("host1", "cpu.load")
                .tag("dc", "sfo")
                .build()
                .unwrap(),
        );
        let input = vec![tagged, metric("host1", "cpu.idle")];
        let constants = vec!["dc=sfo".to_string()];

        let output = IncludeTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &constants))
            .unwrap();
        assert_eq!(names(&output), vec!["cpu.load"]);
    }

    #[test]
    fn test_exclude_scenario() {
        let input = vec![metric("host1", "cpu.load"), metric("host1", "mem.used")];
        let constants = vec!["cpu\\..*".to_string()];

        let output = ExcludeTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &constants))
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].scope(), "host1");
        assert_eq!(output[0].metric(), "mem.used");
    }

    #[test]
    fn test_missing_argument() {
        let input = vec![metric("host1", "cpu.load")];

        for transform in [&IncludeTransform as &dyn Transform, &ExcludeTransform] {
            let err = transform
                .apply(&ctx(), TransformArgs::WithConstants(&input, &[]))
                .unwrap_err();
            assert!(matches!(
                err,
                TransformError::MissingArgument { function, index: 0 } if function == transform.function()
            ));
        }
    }

    #[test]
    fn test_invalid_regex_reports_index() {
        let input = vec![metric("host1", "cpu.load")];
        let constants = vec!["cpu".to_string(), "(unclosed".to_string()];

        let err = ExcludeTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &constants))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::InvalidArgument { function: Function::Exclude, index: 1, .. }
        ));
    }

    #[test]
    fn test_wrong_shape_called_directly() {
        let input = vec![metric("host1", "cpu.load")];
        let lists = [input.as_slice(), input.as_slice()];

        let err = ExcludeTransform
            .apply(&ctx(), TransformArgs::MultiList(&lists))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnsupportedShape { attempted: CallShape::MultiList, .. }
        ));
    }

    #[test]
    fn test_cancelled_before_selection() {
        let input = vec![metric("host1", "cpu.load")];
        let constants = vec![".*".to_string()];
        let ctx = ctx();
        ctx.cancellation_token().cancel();

        let err = ExcludeTransform
            .apply(&ctx, TransformArgs::WithConstants(&input, &constants))
            .unwrap_err();
        assert!(matches!(err, TransformError::Canceled));
    }
}
