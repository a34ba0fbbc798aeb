//! Atomic range predicates `lb ≤ value(var) ≤ ub`.
//!
//! A [`RangePredicate`] is the only kind of formula node that inspects a state directly. Both
//! bounds are inclusive, so a predicate with `lb == ub` acts as an exact equality test, which is
//! how discretized target levels such as `[X,1,1]` are expressed.
//!
//! Any state type implementing [`VariableSet`] can be evaluated.
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use tra::predicate::RangePredicate;
//!
//! let p = RangePredicate::new("X", 0.0, 10.0).unwrap();
//! let state = HashMap::from([("X", 4.0)]);
//!
//! assert_eq!(p.evaluate_state(&state), Ok(true));
//! ```

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use ordered_float::NotNan;
use thiserror::Error;

/// Trait representing a set of named variable values.
pub trait VariableSet {
    /// Return the value for a name in the set if it exists.
    fn value_for(&self, name: &str) -> Option<f64>;
}

impl<K> VariableSet for HashMap<K, f64>
where
    K: Borrow<str> + Eq + Hash,
{
    fn value_for(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<K> VariableSet for BTreeMap<K, f64>
where
    K: Borrow<str> + Ord,
{
    fn value_for(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<T> VariableSet for &T
where
    T: VariableSet + ?Sized,
{
    fn value_for(&self, name: &str) -> Option<f64> {
        (**self).value_for(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("Missing variable")]
    Missing,

    #[error("NaN value for variable")]
    NanValue,
}

/// The error type for evaluating a state using a predicate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Error evaluating predicate: {kind} \"{name}\"")]
pub struct EvaluationError {
    kind: ErrorKind,
    name: String,
}

impl EvaluationError {
    pub fn missing(name: &str) -> Self {
        Self {
            kind: ErrorKind::Missing,
            name: name.to_owned(),
        }
    }

    pub fn nan_value(name: &str) -> Self {
        Self {
            kind: ErrorKind::NanValue,
            name: name.to_owned(),
        }
    }

    /// Return the name of the variable that produced the error
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Error produced when constructing a predicate with unusable bounds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("Predicate bound for \"{0}\" is NaN")]
    NanBound(String),

    #[error("Lower bound {lower} is greater than upper bound {upper} for \"{name}\"")]
    Inverted { name: String, lower: f64, upper: f64 },
}

/// Inclusive bound predicate over a single variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangePredicate {
    variable: String,
    lower: NotNan<f64>,
    upper: NotNan<f64>,
}

impl RangePredicate {
    /// Create a predicate that holds when `lower <= value(variable) <= upper`.
    pub fn new(variable: impl Into<String>, lower: f64, upper: f64) -> Result<Self, BoundsError> {
        let variable = variable.into();
        let nan = || BoundsError::NanBound(variable.clone());
        let lower_bound = NotNan::new(lower).map_err(|_| nan())?;
        let upper_bound = NotNan::new(upper).map_err(|_| nan())?;

        if lower_bound > upper_bound {
            return Err(BoundsError::Inverted {
                name: variable,
                lower,
                upper,
            });
        }

        Ok(Self {
            variable,
            lower: lower_bound,
            upper: upper_bound,
        })
    }

    /// Create a predicate that holds when the variable is exactly `value`.
    pub fn exact(variable: impl Into<String>, value: f64) -> Result<Self, BoundsError> {
        Self::new(variable, value, value)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn lower(&self) -> f64 {
        self.lower.into_inner()
    }

    pub fn upper(&self) -> f64 {
        self.upper.into_inner()
    }

    /// Evaluate a single state against the bounds.
    pub fn evaluate_state<State>(&self, state: &State) -> Result<bool, EvaluationError>
    where
        State: VariableSet + ?Sized,
    {
        let value = state
            .value_for(&self.variable)
            .ok_or_else(|| EvaluationError::missing(&self.variable))?;

        if value.is_nan() {
            return Err(EvaluationError::nan_value(&self.variable));
        }

        Ok(self.lower.into_inner() <= value && value <= self.upper.into_inner())
    }
}

impl Display for RangePredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{}]", self.variable, self.lower, self.upper)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::{BoundsError, ErrorKind, RangePredicate};

    #[test]
    fn inclusive_bounds() -> Result<(), BoundsError> {
        let p = RangePredicate::new("x", 1.0, 2.0)?;

        assert_eq!(p.evaluate_state(&HashMap::from([("x", 1.0)])), Ok(true));
        assert_eq!(p.evaluate_state(&HashMap::from([("x", 2.0)])), Ok(true));
        assert_eq!(p.evaluate_state(&HashMap::from([("x", 2.5)])), Ok(false));
        assert_eq!(p.evaluate_state(&BTreeMap::from([("x", 0.5)])), Ok(false));

        Ok(())
    }

    #[test]
    fn exact_value() -> Result<(), BoundsError> {
        let p = RangePredicate::exact("X", 1.0)?;

        assert_eq!(p.evaluate_state(&HashMap::from([("X", 1.0)])), Ok(true));
        assert_eq!(p.evaluate_state(&HashMap::from([("X", 0.0)])), Ok(false));

        Ok(())
    }

    #[test]
    fn evaluation_errors() -> Result<(), BoundsError> {
        let p = RangePredicate::exact("X", 1.0)?;
        let missing = p.evaluate_state(&HashMap::from([("Y", 1.0)])).unwrap_err();
        let nan = p.evaluate_state(&HashMap::from([("X", f64::NAN)])).unwrap_err();

        assert_eq!(missing.kind(), ErrorKind::Missing);
        assert_eq!(missing.name(), "X");
        assert_eq!(nan.kind(), ErrorKind::NanValue);

        Ok(())
    }

    #[test]
    fn invalid_bounds() {
        assert!(matches!(RangePredicate::new("x", 2.0, 1.0), Err(BoundsError::Inverted { .. })));
        assert!(matches!(RangePredicate::new("x", f64::NAN, 1.0), Err(BoundsError::NanBound(_))));
    }

    #[test]
    fn display() -> Result<(), BoundsError> {
        assert_eq!(RangePredicate::new("X", 0.0, 1.5)?.to_string(), "[X,0,1.5]");
        Ok(())
    }
}
