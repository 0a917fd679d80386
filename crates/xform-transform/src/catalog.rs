//! Transform catalog
//!
//! Maps every [`Function`] to a singleton transform. The catalog is built once
//! at startup and never mutated, so it is shared as `Arc<TransformCatalog>`
//! across concurrent evaluations without any locking.

use crate::aggregation::AggregateFunction;
use crate::context::QueryContext;
use crate::error::{Result, TransformError};
use crate::function::Function;
use crate::shape::TransformArgs;
use crate::transform::Transform;
use crate::transforms::{
    AbsoluteTransform, ExcludeTransform, IdentityTransform, IncludeTransform, ReduceTransform,
    ScaleTransform, UnionTransform,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, debug_span};
use xform_core::MetricList;

/// Immutable function -> transform registry
pub struct TransformCatalog {
    transforms: HashMap<Function, Arc<dyn Transform>>,
}

impl TransformCatalog {
    /// Catalog with every built-in transform registered
    pub fn standard() -> Self {
        let transforms: Vec<Arc<dyn Transform>> = vec![
            Arc::new(IncludeTransform),
            Arc::new(ExcludeTransform),
            Arc::new(UnionTransform),
            Arc::new(IdentityTransform),
            Arc::new(AbsoluteTransform),
            Arc::new(ScaleTransform),
            Arc::new(ReduceTransform::new(Function::Sum, AggregateFunction::Sum)),
            Arc::new(ReduceTransform::new(Function::Average, AggregateFunction::Mean)),
            Arc::new(ReduceTransform::new(Function::Min, AggregateFunction::Min)),
            Arc::new(ReduceTransform::new(Function::Max, AggregateFunction::Max)),
            Arc::new(ReduceTransform::new(Function::Count, AggregateFunction::Count)),
        ];
        Self::from_transforms(transforms)
    }

    /// Catalog holding exactly the given transforms, keyed by their function
    pub fn from_transforms(transforms: impl IntoIterator<Item = Arc<dyn Transform>>) -> Self {
        let transforms = transforms
            .into_iter()
            .map(|t| (t.function(), t))
            .collect();
        Self { transforms }
    }

    /// Get the transform registered for `function`
    pub fn get(&self, function: Function) -> Option<&Arc<dyn Transform>> {
        self.transforms.get(&function)
    }

    /// Check if a function is registered
    pub fn contains(&self, function: Function) -> bool {
        self.transforms.contains_key(&function)
    }

    /// Resolve an expression function name to a registered function
    pub fn resolve(&self, name: &str) -> Result<Function> {
        let function: Function = name.parse()?;
        if !self.contains(function) {
            return Err(TransformError::UnknownFunction(name.to_string()));
        }
        Ok(function)
    }

    /// Registered functions, sorted
    pub fn functions(&self) -> Vec<Function> {
        let mut functions: Vec<Function> = self.transforms.keys().copied().collect();
        functions.sort();
        functions
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Dispatch one transform call.
    ///
    /// Rejects unregistered functions and undeclared call shapes, and refuses
    /// to start once the request is cancelled.
    pub fn invoke(
        &self,
        function: Function,
        ctx: &QueryContext,
        args: TransformArgs<'_>,
    ) -> Result<MetricList> {
        let transform = self
            .get(function)
            .ok_or_else(|| TransformError::UnknownFunction(function.name().to_string()))?;

        let shape = args.shape();
        if !transform.shapes().contains(shape) {
            return Err(TransformError::unsupported_shape(
                function,
                shape,
                transform.shapes(),
            ));
        }

        ctx.check_cancelled()?;

        let span = debug_span!(
            "transform",
            function = function.name(),
            path = %ctx.path(),
            depth = ctx.depth()
        );
        let _guard = span.enter();

        let start = Instant::now();
        let output = transform.apply(ctx, args)?;
        debug!(
            shape = %shape,
            outputs = output.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Transform applied"
        );

        Ok(output)
    }
}

impl Default for TransformCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{CallShape, ShapeSet};
    use xform_core::{Metric, TimeRange};

    fn metrics() -> MetricList {
        vec![
            Arc::new(
                Metric::builder("host1", "cpu.load")
                    .datapoint(1000, 1.0)
                    .build()
                    .unwrap(),
            ),
            Arc::new(
                Metric::builder("host1", "mem.used")
                    .datapoint(1000, 2.0)
                    .build()
                    .unwrap(),
            ),
        ]
    }

    #[test]
    fn test_standard_registers_every_function() {
        let catalog = TransformCatalog::standard();
        assert_eq!(catalog.len(), Function::ALL.len());
        for function in Function::ALL {
            let transform = catalog.get(function).unwrap();
            assert_eq!(transform.function(), function);
            assert_eq!(transform.result_scope_name(), function.name());
        }
    }

    #[test]
    fn test_resolve() {
        let catalog = TransformCatalog::standard();
        assert_eq!(catalog.resolve("exclude").unwrap(), Function::Exclude);
        assert!(matches!(
            catalog.resolve("FOO"),
            Err(TransformError::UnknownFunction(name)) if name == "FOO"
        ));

        // Known name but not registered in this catalog
        let partial = TransformCatalog::from_transforms(vec![
            Arc::new(IncludeTransform) as Arc<dyn Transform>
        ]);
        assert!(partial.resolve("INCLUDE").is_ok());
        assert!(matches!(
            partial.resolve("EXCLUDE"),
            Err(TransformError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_invoke_rejects_undeclared_shape() {
        let catalog = TransformCatalog::standard();
        let ctx = QueryContext::new(TimeRange::new(0, 10_000));
        let list = metrics();
        let lists = [list.as_slice(), list.as_slice()];

        let err = catalog
            .invoke(Function::Exclude, &ctx, TransformArgs::MultiList(&lists))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnsupportedShape {
                function: Function::Exclude,
                attempted: CallShape::MultiList,
                supported,
            } if supported == ShapeSet::WITH_CONSTANTS
        ));

        let err = catalog
            .invoke(Function::Exclude, &ctx, TransformArgs::Plain(&list))
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnsupportedShape { attempted: CallShape::Plain, .. }
        ));
    }

    #[test]
    fn test_invoke_refuses_after_cancellation() {
        let catalog = TransformCatalog::standard();
        let ctx = QueryContext::new(TimeRange::new(0, 10_000));
        let list = metrics();

        ctx.cancellation_token().cancel();

        let err = catalog
            .invoke(Function::Identity, &ctx, TransformArgs::Plain(&list))
            .unwrap_err();
        assert!(matches!(err, TransformError::Canceled));
    }

    #[test]
    fn test_invoke_dispatches() {
        let catalog = TransformCatalog::standard();
        let ctx = QueryContext::new(TimeRange::new(0, 10_000));
        let list = metrics();
        let constants = vec!["cpu\\..*".to_string()];

        let output = catalog
            .invoke(
                Function::Exclude,
                &ctx,
                TransformArgs::WithConstants(&list, &constants),
            )
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].metric(), "mem.used");
    }
}
