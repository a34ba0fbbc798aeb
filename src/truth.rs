//! Three-valued truth used by the model checker.
//!
//! While a trace is still streaming in, many sub-formulas cannot be decided yet. Instead of
//! forcing an early answer, every node of the formula carries a [`Truth`] value which is either
//! [`Truth::True`], [`Truth::False`] or [`Truth::Unknown`]. The boolean connectives follow the
//! strong [Kleene] semantics, so a connective is decided as soon as one operand forces the result:
//!
//! | left    | right   | and     | or      |
//! | ------- | ------- | ------- | ------- |
//! | True    | Unknown | Unknown | True    |
//! | False   | Unknown | False   | Unknown |
//! | Unknown | Unknown | Unknown | Unknown |
//!
//! [Kleene]: https://en.wikipedia.org/wiki/Three-valued_logic
//!
//! # Examples
//!
//! ```rust
//! use tra::Truth;
//!
//! assert_eq!(Truth::False & Truth::Unknown, Truth::False);
//! assert_eq!(Truth::True | Truth::Unknown, Truth::True);
//! assert_eq!(!Truth::Unknown, Truth::Unknown);
//! ```

use std::fmt::{Display, Formatter};
use std::ops::{BitAnd, BitOr, Not};

/// A truth value that may not have been determined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Truth {
    True,
    False,
    #[default]
    Unknown,
}

impl Truth {
    /// Returns `true` if the value has been decided.
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Convert into a boolean, returning [`None`] while the value is undecided.
    pub fn known(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<Option<bool>> for Truth {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}

impl Not for Truth {
    type Output = Truth;

    fn not(self) -> Self::Output {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

impl BitAnd for Truth {
    type Output = Truth;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }
}

impl BitOr for Truth {
    type Output = Truth;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }
}

impl Display for Truth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
