//! Per-series value transforms

use crate::context::QueryContext;
use crate::error::{Result, TransformError};
use crate::function::Function;
use crate::shape::{ShapeSet, TransformArgs};
use crate::transform::Transform;
use std::sync::Arc;
use xform_core::{Metric, MetricList};

fn map_each(
    ctx: &QueryContext,
    metrics: &[Arc<Metric>],
    f: impl Fn(f64) -> f64,
) -> Result<MetricList> {
    let mut output = Vec::with_capacity(metrics.len());
    for metric in metrics {
        ctx.check_cancelled()?;
        output.push(Arc::new(metric.map_values(&f)));
    }
    Ok(output)
}

/// IDENTITY(expr)
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl Transform for IdentityTransform {
    fn function(&self) -> Function {
        Function::Identity
    }

    fn shapes(&self) -> ShapeSet {
        ShapeSet::PLAIN
    }

    fn apply(&self, _ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList> {
        match args {
            TransformArgs::Plain(metrics) => Ok(metrics.to_vec()),
            other => Err(TransformError::unsupported_shape(
                self.function(),
                other.shape(),
                self.shapes(),
            )),
        }
    }
}

/// ABSOLUTE(expr)
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsoluteTransform;

impl Transform for AbsoluteTransform {
    fn function(&self) -> Function {
        Function::Absolute
    }

    fn shapes(&self) -> ShapeSet {
        ShapeSet::PLAIN
    }

    fn apply(&self, ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList> {
        match args {
            TransformArgs::Plain(metrics) => map_each(ctx, metrics, f64::abs),
            other => Err(TransformError::unsupported_shape(
                self.function(),
                other.shape(),
                self.shapes(),
            )),
        }
    }
}

/// SCALE(expr, factor)
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleTransform;

impl ScaleTransform {
    fn factor(constants: &[String]) -> Result<f64> {
        let function = Function::Scale;
        let raw = constants
            .first()
            .ok_or(TransformError::MissingArgument { function, index: 0 })?;

        if constants.len() > 1 {
            return Err(TransformError::InvalidArgument {
                function,
                index: 1,
                reason: "unexpected extra constant".to_string(),
            });
        }

        raw.trim()
            .parse::<f64>()
            .map_err(|e| TransformError::InvalidArgument {
                function,
                index: 0,
                reason: format!("'{}' is not a number: {}", raw, e),
            })
    }
}

impl Transform for ScaleTransform {
    fn function(&self) -> Function {
        Function::Scale
    }

    fn shapes(&self) -> ShapeSet {
        ShapeSet::WITH_CONSTANTS
    }

    fn apply(&self, ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList> {
        match args {
            TransformArgs::WithConstants(metrics, constants) => {
                let factor = Self::factor(constants)?;
                map_each(ctx, metrics, |v| v * factor)
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

    fn input() -> MetricList {
        vec![Arc::new(
            Metric::builder("host1", "temp")
                .units("C")
                .datapoint(1000, -2.0)
                .datapoint(2000, 3.0)
                .build()
                .unwrap(),
        )]
    }

    fn ctx() -> QueryContext {
        QueryContext::new(TimeRange::new(0, 10_000))
    }

    #[test]
    fn test_identity() {
        let input = input();
        let output = IdentityTransform
            .apply(&ctx(), TransformArgs::Plain(&input))
            .unwrap();
        assert!(Arc::ptr_eq(&output[0], &input[0]));
    }

    #[test]
    fn test_absolute() {
        let input = input();
        let output = AbsoluteTransform
            .apply(&ctx(), TransformArgs::Plain(&input))
            .unwrap();

        assert_eq!(output[0].identity(), input[0].identity());
        assert_eq!(output[0].units(), Some("C"));
        assert_eq!(output[0].datapoints().get(&1000), Some(&2.0));
        assert_eq!(input[0].datapoints().get(&1000), Some(&-2.0));
    }

    #[test]
    fn test_scale() {
        let input = input();
        let constants = vec!["0.5".to_string()];
        let output = ScaleTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &constants))
            .unwrap();
        assert_eq!(output[0].datapoints().get(&1000), Some(&-1.0));
        assert_eq!(output[0].datapoints().get(&2000), Some(&1.5));
    }

    #[test]
    fn test_scale_argument_errors() {
        let input = input();

        let err = ScaleTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingArgument { function: Function::Scale, index: 0 }
        ));

        let constants = vec!["ten".to_string()];
        let err = ScaleTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &constants))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidArgument { index: 0, .. }));

        let constants = vec!["2".to_string(), "3".to_string()];
        let err = ScaleTransform
            .apply(&ctx(), TransformArgs::WithConstants(&input, &constants))
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidArgument { index: 1, .. }));
    }
}
