//! The transform contract

use crate::context::QueryContext;
use crate::error::Result;
use crate::function::Function;
use crate::shape::{ShapeSet, TransformArgs};
use xform_core::MetricList;

/// A named, stateless operation over one or more metric lists.
///
/// Implementations hold no mutable state, so a single instance can be
/// invoked concurrently from any number of evaluations. Inputs are shared
/// read-only; outputs are new lists (which may reference unchanged input
/// metrics, since metrics are immutable).
pub trait Transform: Send + Sync {
    /// The function this transform implements
    fn function(&self) -> Function;

    /// Call shapes this transform accepts
    fn shapes(&self) -> ShapeSet;

    /// Scope given to series this transform synthesizes
    fn result_scope_name(&self) -> &'static str {
        self.function().name()
    }

    /// Apply the transform.
    ///
    /// Callers go through [`TransformCatalog::invoke`](crate::TransformCatalog::invoke),
    /// which has already rejected shapes outside [`Transform::shapes`].
    fn apply(&self, ctx: &QueryContext, args: TransformArgs<'_>) -> Result<MetricList>;
}
