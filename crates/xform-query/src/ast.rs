//! Expression tree
//!
//! Leaves are backend fetches, internal nodes are transform calls. The
//! `Display` form of a node is its canonical text, which the parser accepts.
//! Nodes hash structurally; the evaluator keys shared results on the node
//! itself so that leaves built in code never alias through their text.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use xform_transform::{CallShape, Function};

/// Leaf expression: `[namespace::]scope:metric{k=v,...}`.
///
/// Every field is a pattern: `*` matches anything and `a|b` matches either
/// alternative.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchExpr {
    namespace: Option<String>,
    scope: String,
    metric: String,
    tags: BTreeMap<String, String>,
}

impl FetchExpr {
    pub fn new(scope: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            namespace: None,
            scope: scope.into(),
            metric: metric.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Set the namespace pattern
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a tag filter
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn namespace_pattern(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

impl fmt::Display for FetchExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}::", namespace)?;
        }
        write!(f, "{}:{}", self.scope, self.metric)?;

        if !self.tags.is_empty() {
            f.write_str("{")?;
            for (i, (k, v)) in self.tags.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

/// Transform call: `NAME(input, ..., "constant", ...)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallExpr {
    function: Function,
    inputs: Vec<Arc<Expr>>,
    constants: Vec<String>,
}

impl CallExpr {
    pub fn new(function: Function, inputs: Vec<Arc<Expr>>, constants: Vec<String>) -> Self {
        Self {
            function,
            inputs,
            constants,
        }
    }

    pub fn function(&self) -> Function {
        self.function
    }

    pub fn inputs(&self) -> &[Arc<Expr>] {
        &self.inputs
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    /// Call shape implied by the argument counts, `None` if there is no valid one
    pub fn shape(&self) -> Option<CallShape> {
        match (self.inputs.len(), self.constants.is_empty()) {
            (0, _) => None,
            (1, true) => Some(CallShape::Plain),
            (1, false) => Some(CallShape::WithConstants),
            (_, true) => Some(CallShape::MultiList),
            (_, false) => None,
        }
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;

        let mut first = true;
        for input in &self.inputs {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}", input)?;
        }
        for constant in &self.constants {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write_quoted(f, constant)?;
        }

        f.write_str(")")
    }
}

/// Write `value` as a double-quoted constant, escaping `\` and `"`
fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

/// A parsed expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Fetch(FetchExpr),
    Call(CallExpr),
}

impl Expr {
    /// Leaf fetching `scope:metric`
    pub fn fetch(scope: impl Into<String>, metric: impl Into<String>) -> Self {
        Expr::Fetch(FetchExpr::new(scope, metric))
    }

    /// Call of `function` on expressions followed by constants
    pub fn call(
        function: Function,
        inputs: impl IntoIterator<Item = Expr>,
        constants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Expr::Call(CallExpr::new(
            function,
            inputs.into_iter().map(Arc::new).collect(),
            constants.into_iter().map(Into::into).collect(),
        ))
    }

    /// Canonical text, identical to `Display`
    pub fn canonical_text(&self) -> String {
        self.to_string()
    }

    /// Number of leaf fetches in the tree, counting shared subtrees each time
    pub fn leaf_count(&self) -> usize {
        match self {
            Expr::Fetch(_) => 1,
            Expr::Call(call) => call.inputs.iter().map(|e| e.leaf_count()).sum(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Fetch(fetch) => write!(f, "{}", fetch),
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

impl From<FetchExpr> for Expr {
    fn from(fetch: FetchExpr) -> Self {
        Expr::Fetch(fetch)
    }
}
