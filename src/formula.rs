//! Formula trees over atomic range predicates.
//!
//! The temporal grammar supports the first-order connectives `!`, `&` and `|` together with the
//! unbounded forward operators `F` ("eventually") and `G` ("always"). Formulas are built either
//! with the constructors on [`Formula`] or by parsing a string with
//! [`parse_formula`](crate::parser::parse_formula). The [`Display`] implementation writes the same
//! grammar back out, so a formula survives a round trip through its string form.
//!
//! ```rust
//! use tra::Formula;
//!
//! let sustained = Formula::eventually(Formula::always(Formula::exact("X", 1.0)?));
//! assert_eq!(sustained.to_string(), "FG[X,1,1]");
//! # Ok::<(), tra::predicate::BoundsError>(())
//! ```

use std::fmt::{Display, Formatter};

use crate::predicate::{BoundsError, RangePredicate};

/// Operator kind of a formula node, without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Atomic,
    Not,
    And,
    Or,
    Eventually,
    Always,
}

/// A temporal logic formula. Children are owned by their parent so the tree is acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    Atomic(RangePredicate),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Eventually(Box<Formula>),
    Always(Box<Formula>),
}

impl Formula {
    pub fn atomic(predicate: RangePredicate) -> Self {
        Self::Atomic(predicate)
    }

    /// Shorthand for an atomic `[variable,lower,upper]` node.
    pub fn range(variable: impl Into<String>, lower: f64, upper: f64) -> Result<Self, BoundsError> {
        RangePredicate::new(variable, lower, upper).map(Self::Atomic)
    }

    /// Shorthand for an atomic `[variable,value,value]` node.
    pub fn exact(variable: impl Into<String>, value: f64) -> Result<Self, BoundsError> {
        RangePredicate::exact(variable, value).map(Self::Atomic)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(subformula: Formula) -> Self {
        Self::Not(Box::new(subformula))
    }

    pub fn and(left: Formula, right: Formula) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Formula, right: Formula) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn eventually(subformula: Formula) -> Self {
        Self::Eventually(Box::new(subformula))
    }

    pub fn always(subformula: Formula) -> Self {
        Self::Always(Box::new(subformula))
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Self::Atomic(_) => OperatorKind::Atomic,
            Self::Not(_) => OperatorKind::Not,
            Self::And(..) => OperatorKind::And,
            Self::Or(..) => OperatorKind::Or,
            Self::Eventually(_) => OperatorKind::Eventually,
            Self::Always(_) => OperatorKind::Always,
        }
    }

    /// Operands of this node, left to right.
    pub fn children(&self) -> Vec<&Formula> {
        match self {
            Self::Atomic(_) => Vec::new(),
            Self::Not(sub) | Self::Eventually(sub) | Self::Always(sub) => vec![sub.as_ref()],
            Self::And(left, right) | Self::Or(left, right) => vec![left.as_ref(), right.as_ref()],
        }
    }

    /// Operator kinds in pre-order.
    pub fn operators(&self) -> Vec<OperatorKind> {
        let mut kinds = vec![self.kind()];

        for child in self.children() {
            kinds.extend(child.operators());
        }

        kinds
    }

    /// Atomic predicates in left-to-right order.
    pub fn predicates(&self) -> Vec<&RangePredicate> {
        match self {
            Self::Atomic(predicate) => vec![predicate],
            _ => self.children().into_iter().flat_map(Formula::predicates).collect(),
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        1 + self.children().into_iter().map(Formula::size).sum::<usize>()
    }
}

impl From<RangePredicate> for Formula {
    fn from(predicate: RangePredicate) -> Self {
        Self::Atomic(predicate)
    }
}

// Binary operands are parenthesized unless they are atoms or prefix chains, which bind tighter
// than either connective.
struct Operand<'a>(&'a Formula);

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Formula::And(..) | Formula::Or(..) => write!(f, "({})", self.0),
            other => write!(f, "{}", other),
        }
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atomic(predicate) => write!(f, "{}", predicate),
            Self::Not(sub) => write!(f, "!{}", Operand(sub)),
            Self::Eventually(sub) => write!(f, "F{}", Operand(sub)),
            Self::Always(sub) => write!(f, "G{}", Operand(sub)),
            Self::And(left, right) => write!(f, "{} & {}", Operand(left), Operand(right)),
            Self::Or(left, right) => write!(f, "{} | {}", Operand(left), Operand(right)),
        }
    }
}
