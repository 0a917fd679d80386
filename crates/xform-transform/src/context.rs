//! Per-request evaluation context
//!
//! A `QueryContext` is created once per evaluation and handed, read-only, to
//! every transform call. Child contexts link back to their parent so that a
//! failure or a trace line can name the full function chain (`SUM/EXCLUDE`).

use crate::error::{Result, TransformError};
use crate::function::Function;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use xform_core::TimeRange;

/// Evaluation state shared by all transform calls of one request
#[derive(Debug, Clone)]
pub struct QueryContext {
    time_range: TimeRange,
    cancel: CancellationToken,
    parent: Option<Arc<QueryContext>>,
    function: Option<Function>,
}

impl QueryContext {
    /// Root context with its own cancellation token
    pub fn new(time_range: TimeRange) -> Self {
        Self::with_cancellation(time_range, CancellationToken::new())
    }

    /// Root context bound to a caller-owned cancellation token
    pub fn with_cancellation(time_range: TimeRange, cancel: CancellationToken) -> Self {
        Self {
            time_range,
            cancel,
            parent: None,
            function: None,
        }
    }

    /// Context for a nested call of `function`; shares the cancellation token
    pub fn child(self: &Arc<Self>, function: Function) -> QueryContext {
        Self {
            time_range: self.time_range,
            cancel: self.cancel.clone(),
            parent: Some(Arc::clone(self)),
            function: Some(function),
        }
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Function this context was created for, `None` at the root
    pub fn function(&self) -> Option<Function> {
        self.function
    }

    pub fn parent(&self) -> Option<&QueryContext> {
        self.parent.as_deref()
    }

    /// Nesting depth, zero at the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(ctx) = current {
            depth += 1;
            current = ctx.parent();
        }
        depth
    }

    /// Function chain from the root down to this context, e.g. `SUM/EXCLUDE`
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some(function) = ctx.function {
                names.push(function.name());
            }
            current = ctx.parent();
        }
        names.reverse();
        names.join("/")
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with `Canceled` once the request has been cancelled
    pub fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(TransformError::Canceled);
        }
        Ok(())
    }
}
