//! Expression evaluator
//!
//! Walks an expression tree bottom-up:
//! - sibling subtrees are evaluated concurrently and joined fail-fast
//! - leaf fetches are bounded by a per-request semaphore
//! - structurally identical subtrees are evaluated once per request
//! - cancellation (caller token or timeout) drops in-flight fetches and
//!   stops any further transform invocation

use crate::ast::{CallExpr, Expr, FetchExpr};
use crate::backend::SeriesBackend;
use crate::error::{CancelReason, QueryError, Result};
use crate::parser::ExprParser;
use dashmap::DashMap;
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, trace, warn, Instrument};
use xform_core::{Metric, MetricList, TimeRange};
use xform_transform::{CallShape, QueryContext, TransformArgs, TransformCatalog};

/// Evaluator settings
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Upper bound on concurrent backend fetches within one request
    pub max_concurrent_fetches: usize,
    /// Per-request deadline, `None` for no limit
    pub timeout: Option<Duration>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Evaluates expressions against a backend using an immutable catalog
pub struct Evaluator {
    catalog: Arc<TransformCatalog>,
    backend: Arc<dyn SeriesBackend>,
    config: EvaluatorConfig,
}

impl Evaluator {
    /// Create an evaluator with default settings
    pub fn new(catalog: Arc<TransformCatalog>, backend: Arc<dyn SeriesBackend>) -> Self {
        Self::with_config(catalog, backend, EvaluatorConfig::default())
    }

    pub fn with_config(
        catalog: Arc<TransformCatalog>,
        backend: Arc<dyn SeriesBackend>,
        config: EvaluatorConfig,
    ) -> Self {
        Self {
            catalog,
            backend,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<TransformCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Parse expression text against this evaluator's catalog
    pub fn parse(&self, text: &str) -> Result<Expr> {
        ExprParser::new(&self.catalog).parse(text)
    }

    /// Parse and evaluate expression text
    pub async fn evaluate_str(&self, text: &str, range: TimeRange) -> Result<MetricList> {
        let expr = self.parse(text)?;
        self.evaluate(&expr, range).await
    }

    /// Evaluate an expression over `range`
    pub async fn evaluate(&self, expr: &Expr, range: TimeRange) -> Result<MetricList> {
        self.evaluate_with_cancellation(expr, range, CancellationToken::new())
            .await
    }

    /// Evaluate an expression, stopping early once `cancel` fires
    pub async fn evaluate_with_cancellation(
        &self,
        expr: &Expr,
        range: TimeRange,
        cancel: CancellationToken,
    ) -> Result<MetricList> {
        range.validate()?;

        // The timeout cancels only this request's token, never the caller's
        let token = cancel.child_token();
        let request = Request {
            catalog: Arc::clone(&self.catalog),
            backend: Arc::clone(&self.backend),
            fetch_permits: Semaphore::new(self.config.max_concurrent_fetches.max(1)),
            memo: DashMap::new(),
            fetches: AtomicUsize::new(0),
            cancel: token.clone(),
        };
        let root = Arc::new(QueryContext::with_cancellation(range, token.clone()));

        let span = info_span!(
            "evaluate",
            expr = %expr,
            start = range.start,
            end = range.end,
            window_ms = range.duration_millis()
        );
        let start = Instant::now();

        let work = request.eval(expr, root).instrument(span.clone());
        let result = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, work).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    token.cancel();
                    let _enter = span.enter();
                    warn!(timeout_ms = timeout.as_millis() as u64, "Query timeout exceeded");
                    return Err(QueryError::Canceled(CancelReason::Timeout));
                }
            },
            None => work.await,
        };

        let fetches = request.fetches.load(Ordering::Relaxed);
        drop(request);

        let _enter = span.enter();
        match result {
            Ok(output) => {
                debug!(
                    series = output.len(),
                    fetches,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Evaluation complete"
                );
                Ok(Arc::try_unwrap(output).unwrap_or_else(|shared| shared.as_ref().clone()))
            }
            Err(e) => {
                debug!(error = %e, fetches, "Evaluation failed");
                Err(e)
            }
        }
    }
}

/// State owned by one evaluation request
struct Request {
    catalog: Arc<TransformCatalog>,
    backend: Arc<dyn SeriesBackend>,
    fetch_permits: Semaphore,
    memo: DashMap<Expr, Arc<OnceCell<Arc<MetricList>>>>,
    fetches: AtomicUsize,
    cancel: CancellationToken,
}

impl Request {
    /// Evaluate `expr`, sharing the result with every other occurrence of the
    /// same subtree in this request
    fn eval<'a>(
        &'a self,
        expr: &'a Expr,
        ctx: Arc<QueryContext>,
    ) -> BoxFuture<'a, Result<Arc<MetricList>>> {
        async move {
            let cell = Arc::clone(self.memo.entry(expr.clone()).or_default().value());

            let ctx = &ctx;
            let output = cell
                .get_or_try_init(|| async move {
                    match expr {
                        Expr::Fetch(leaf) => self.fetch(leaf, ctx).await,
                        Expr::Call(call) => self.call(call, ctx).await,
                    }
                })
                .await?;
            Ok(Arc::clone(output))
        }
        .boxed()
    }

    async fn fetch(&self, leaf: &FetchExpr, ctx: &QueryContext) -> Result<Arc<MetricList>> {
        let canceled = || QueryError::Canceled(CancelReason::Requested);

        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(canceled()),
            permit = self.fetch_permits.acquire() => permit.map_err(|_| canceled())?,
        };

        self.fetches.fetch_add(1, Ordering::Relaxed);
        let series = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(canceled()),
            result = self.backend.fetch(leaf, ctx.time_range()) => {
                result.map_err(|source| QueryError::BackendFailure {
                    leaf: leaf.to_string(),
                    source,
                })?
            }
        };

        trace!(leaf = %leaf, series = series.len(), "Fetched leaf");
        Ok(Arc::new(series))
    }

    async fn call(&self, call: &CallExpr, parent: &Arc<QueryContext>) -> Result<Arc<MetricList>> {
        let shape = call.shape().ok_or_else(|| QueryError::Parse {
            position: 0,
            message: format!("{} has no valid call shape", call),
        })?;

        let ctx = Arc::new(parent.child(call.function()));
        let inputs = try_join_all(
            call.inputs()
                .iter()
                .map(|input| self.eval(input, Arc::clone(&ctx))),
        )
        .await?;

        let function = call.function();
        let output = match shape {
            CallShape::Plain => {
                self.catalog
                    .invoke(function, &ctx, TransformArgs::Plain(&inputs[0]))?
            }
            CallShape::WithConstants => self.catalog.invoke(
                function,
                &ctx,
                TransformArgs::WithConstants(&inputs[0], call.constants()),
            )?,
            CallShape::MultiList => {
                let lists: Vec<&[Arc<Metric>]> = inputs.iter().map(|l| l.as_slice()).collect();
                self.catalog
                    .invoke(function, &ctx, TransformArgs::MultiList(&lists))?
            }
        };

        Ok(Arc::new(output))
    }
}
