//! Expression text parser
//!
//! Grammar:
//!
//! ```text
//! expr     := call | leaf
//! call     := NAME '(' arg (',' arg)* ')'
//! arg      := expr | constant
//! constant := '"' chars '"' | '#' chars '#'
//! leaf     := [namespace '::'] scope ':' metric ['{' key '=' value (',' key '=' value)* '}']
//! ```
//!
//! Inside `"..."`, `\"` and `\\` are escapes and any other backslash is kept
//! as written, so regex constants such as `"cpu\..*"` need no doubling.
//! `#...#` constants are taken verbatim.
//!
//! Function names are resolved against the catalog while parsing, so an
//! unknown function fails before any backend I/O. Positions in errors are
//! byte offsets into the input.

use crate::ast::{CallExpr, Expr, FetchExpr};
use crate::error::{QueryError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use xform_transform::{TransformCatalog, TransformError};

/// Parser bound to the catalog that resolves function names
pub struct ExprParser<'a> {
    catalog: &'a TransformCatalog,
}

impl<'a> ExprParser<'a> {
    pub fn new(catalog: &'a TransformCatalog) -> Self {
        Self { catalog }
    }

    /// Parse a complete expression
    pub fn parse(&self, input: &str) -> Result<Expr> {
        let mut cursor = Cursor::new(input);
        let expr = self.parse_expr(&mut cursor)?;

        cursor.skip_whitespace();
        if !cursor.at_end() {
            return Err(QueryError::parse(cursor.pos, "unexpected trailing input"));
        }
        Ok(expr)
    }

    fn parse_expr(&self, cursor: &mut Cursor<'_>) -> Result<Expr> {
        cursor.skip_whitespace();
        let start = cursor.pos;
        let word = cursor.take_while(is_word_char);
        if word.is_empty() {
            return Err(match cursor.peek() {
                Some(c) => QueryError::parse(start, format!("unexpected '{}'", c)),
                None => QueryError::parse(start, "unexpected end of input"),
            });
        }

        cursor.skip_whitespace();
        if cursor.peek() == Some('(') {
            self.parse_call(cursor, word, start)
        } else {
            Self::parse_leaf(cursor, word, start).map(Expr::Fetch)
        }
    }

    fn parse_call(&self, cursor: &mut Cursor<'_>, name: &str, start: usize) -> Result<Expr> {
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(QueryError::parse(start, format!("invalid function name '{}'", name)));
        }

        let function = self
            .catalog
            .resolve(name)
            .map_err(|_| QueryError::UnknownFunction {
                name: name.to_string(),
                position: start,
            })?;

        cursor.expect('(')?;

        let mut inputs = Vec::new();
        let mut constants = Vec::new();
        loop {
            cursor.skip_whitespace();
            let arg_start = cursor.pos;
            match cursor.peek() {
                Some(')') if inputs.is_empty() && constants.is_empty() => {
                    return Err(QueryError::parse(
                        arg_start,
                        format!("{} requires at least one expression input", function),
                    ));
                }
                Some(quote @ ('"' | '#')) => constants.push(cursor.constant(quote)?),
                _ => {
                    if !constants.is_empty() {
                        return Err(QueryError::parse(
                            arg_start,
                            "constants must follow all expression inputs",
                        ));
                    }
                    inputs.push(Arc::new(self.parse_expr(cursor)?));
                }
            }

            cursor.skip_whitespace();
            match cursor.next() {
                Some(',') => continue,
                Some(')') => break,
                Some(c) => {
                    return Err(QueryError::parse(
                        cursor.pos - c.len_utf8(),
                        format!("expected ',' or ')' but found '{}'", c),
                    ))
                }
                None => return Err(QueryError::parse(cursor.pos, "unclosed argument list")),
            }
        }

        let call = CallExpr::new(function, inputs, constants);
        let shape = call.shape().ok_or_else(|| {
            QueryError::parse(
                start,
                format!("{} cannot combine several expression inputs with constants", function),
            )
        })?;

        // Reject undeclared shapes here so no backend I/O happens for them
        if let Some(transform) = self.catalog.get(function) {
            if !transform.shapes().contains(shape) {
                return Err(
                    TransformError::unsupported_shape(function, shape, transform.shapes()).into(),
                );
            }
        }
        Ok(Expr::Call(call))
    }

    fn parse_leaf(cursor: &mut Cursor<'_>, word: &str, start: usize) -> Result<FetchExpr> {
        let (namespace, rest) = match word.split_once("::") {
            Some((ns, rest)) => (Some(ns), rest),
            None => (None, word),
        };
        let (scope, metric) = rest.split_once(':').ok_or_else(|| {
            QueryError::parse(start, format!("expected 'scope:metric' but found '{}'", word))
        })?;

        if namespace.is_some_and(str::is_empty) {
            return Err(QueryError::parse(start, "empty namespace"));
        }
        if scope.is_empty() {
            return Err(QueryError::parse(start, "empty scope"));
        }
        if metric.is_empty() {
            return Err(QueryError::parse(start, "empty metric name"));
        }

        let mut leaf = FetchExpr::new(scope, metric);
        if let Some(ns) = namespace {
            leaf = leaf.namespace(ns);
        }

        if cursor.peek() == Some('{') {
            for (key, value) in Self::parse_tags(cursor)? {
                leaf = leaf.tag(key, value);
            }
        }
        Ok(leaf)
    }

    fn parse_tags(cursor: &mut Cursor<'_>) -> Result<BTreeMap<String, String>> {
        cursor.expect('{')?;

        let mut tags = BTreeMap::new();
        loop {
            cursor.skip_whitespace();
            let key_start = cursor.pos;
            let key = cursor.take_while(|c| !matches!(c, '=' | ',' | '}') && !c.is_whitespace());
            if key.is_empty() {
                return Err(QueryError::parse(key_start, "empty tag key"));
            }
            cursor.skip_whitespace();
            cursor.expect('=')?;
            cursor.skip_whitespace();

            let value = cursor.take_while(|c| !matches!(c, ',' | '}') && !c.is_whitespace());
            if value.is_empty() {
                return Err(QueryError::parse(cursor.pos, format!("empty value for tag '{}'", key)));
            }
            if tags.insert(key.to_string(), value.to_string()).is_some() {
                return Err(QueryError::parse(key_start, format!("duplicate tag key '{}'", key)));
            }

            cursor.skip_whitespace();
            match cursor.next() {
                Some(',') => continue,
                Some('}') => break,
                _ => return Err(QueryError::parse(cursor.pos, "unclosed tag block")),
            }
        }
        Ok(tags)
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | ',' | '{' | '}' | '"' | '#')
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        let pos = self.pos;
        match self.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(QueryError::parse(
                pos,
                format!("expected '{}' but found '{}'", expected, c),
            )),
            None => Err(QueryError::parse(
                pos,
                format!("expected '{}' but found end of input", expected),
            )),
        }
    }

    /// Read a `"..."` or `#...#` constant starting at the opening delimiter
    fn constant(&mut self, delimiter: char) -> Result<String> {
        let start = self.pos;
        self.expect(delimiter)?;

        let mut value = String::new();
        loop {
            match self.next() {
                None => return Err(QueryError::parse(start, "unterminated constant")),
                Some(c) if c == delimiter => return Ok(value),
                Some('\\') if delimiter == '"' => match self.peek() {
                    Some(escaped @ ('"' | '\\')) => {
                        self.pos += 1;
                        value.push(escaped);
                    }
                    _ => value.push('\\'),
                },
                Some(c) => value.push(c),
            }
        }
    }
}
