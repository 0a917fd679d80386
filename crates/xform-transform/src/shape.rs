//! Call shapes
//!
//! A transform may be called with a single list, a single list plus string
//! constants, or several independently evaluated lists. Each transform
//! declares the shapes it accepts as a `ShapeSet`; the catalog rejects any
//! other shape before the transform runs.

use crate::function::Function;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use xform_core::Metric;

/// The arity variant of a transform call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    /// `F(expr)`
    Plain,
    /// `F(expr, constant...)`
    WithConstants,
    /// `F(expr, expr...)`
    MultiList,
}

impl CallShape {
    fn bit(self) -> u8 {
        match self {
            CallShape::Plain => 0b001,
            CallShape::WithConstants => 0b010,
            CallShape::MultiList => 0b100,
        }
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallShape::Plain => f.write_str("(expr)"),
            CallShape::WithConstants => f.write_str("(expr, constant...)"),
            CallShape::MultiList => f.write_str("(expr, expr...)"),
        }
    }
}

/// Set of call shapes a transform supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeSet(u8);

impl ShapeSet {
    pub const PLAIN: ShapeSet = ShapeSet(0b001);
    pub const WITH_CONSTANTS: ShapeSet = ShapeSet(0b010);
    pub const MULTI_LIST: ShapeSet = ShapeSet(0b100);

    /// Check whether `shape` is in the set
    pub fn contains(self, shape: CallShape) -> bool {
        self.0 & shape.bit() != 0
    }

    /// Shapes in the set, in `Plain`, `WithConstants`, `MultiList` order
    pub fn shapes(self) -> impl Iterator<Item = CallShape> {
        [CallShape::Plain, CallShape::WithConstants, CallShape::MultiList]
            .into_iter()
            .filter(move |s| self.contains(*s))
    }

    /// Human readable list of the accepted call forms for `function`
    pub fn describe(self, function: Function) -> String {
        let forms: Vec<String> = self
            .shapes()
            .map(|shape| format!("{}{}", function, shape))
            .collect();
        if forms.is_empty() {
            "no call shape".to_string()
        } else {
            forms.join(" or ")
        }
    }
}

impl BitOr for ShapeSet {
    type Output = ShapeSet;

    fn bitor(self, rhs: ShapeSet) -> ShapeSet {
        ShapeSet(self.0 | rhs.0)
    }
}

/// Arguments of one transform call, tagged by shape
#[derive(Debug, Clone, Copy)]
pub enum TransformArgs<'a> {
    Plain(&'a [Arc<Metric>]),
    WithConstants(&'a [Arc<Metric>], &'a [String]),
    MultiList(&'a [&'a [Arc<Metric>]]),
}

impl TransformArgs<'_> {
    /// The call shape of these arguments
    pub fn shape(&self) -> CallShape {
        match self {
            TransformArgs::Plain(_) => CallShape::Plain,
            TransformArgs::WithConstants(..) => CallShape::WithConstants,
            TransformArgs::MultiList(_) => CallShape::MultiList,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_set_membership() {
        let set = ShapeSet::PLAIN | ShapeSet::MULTI_LIST;
        assert!(set.contains(CallShape::Plain));
        assert!(!set.contains(CallShape::WithConstants));
        assert!(set.contains(CallShape::MultiList));
        assert_eq!(set.shapes().count(), 2);
    }

    #[test]
    fn test_describe() {
        let set = ShapeSet::PLAIN | ShapeSet::MULTI_LIST;
        assert_eq!(set.describe(Function::Union), "UNION(expr) or UNION(expr, expr...)");
        assert_eq!(
            ShapeSet::WITH_CONSTANTS.describe(Function::Exclude),
            "EXCLUDE(expr, constant...)"
        );
    }

    #[test]
    fn test_args_shape() {
        let list: Vec<Arc<Metric>> = Vec::new();
        let constants = vec!["x".to_string()];
        let lists = [list.as_slice(), list.as_slice()];

        assert_eq!(TransformArgs::Plain(&list).shape(), CallShape::Plain);
        assert_eq!(
            TransformArgs::WithConstants(&list, &constants).shape(),
            CallShape::WithConstants
        );
        assert_eq!(TransformArgs::MultiList(&lists).shape(), CallShape::MultiList);
    }
}
