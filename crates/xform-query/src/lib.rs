//! Xform Query - Expression parsing and evaluation
//!
//! This crate provides:
//! - The expression tree (`Expr`) and its text parser
//! - The `SeriesBackend` contract and an in-memory backend
//! - `Evaluator`: concurrent, fail-fast, cancellable evaluation with
//!   per-request sharing of identical subexpressions

pub mod ast;
pub mod backend;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{CallExpr, Expr, FetchExpr};
pub use backend::{BackendError, InMemoryBackend, SeriesBackend};
pub use error::{CancelReason, ErrorKind, QueryError, Result};
pub use evaluator::{Evaluator, EvaluatorConfig};
pub use parser::ExprParser;
