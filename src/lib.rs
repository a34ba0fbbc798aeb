#![deny(clippy::all)]
//! Temporal reasoning over stochastic simulations.
//!
//! This crate answers questions of the form "does the amount of this species show this shape
//! over time?" by compiling a named [temporal pattern](pattern::PatternKind) into a small temporal
//! logic, simulating the model repeatedly and checking each run incrementally with a three-valued
//! [`ModelChecker`](checker::ModelChecker).
//!
//! The pieces can also be used on their own. A formula string can be checked against any trace
//! whose states implement [`VariableSet`](predicate::VariableSet):
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use tra::{check_formula, Trace};
//!
//! let trace: Trace<HashMap<&str, f64>> = [0.0, 1.0, 1.0, 0.0, 0.0, 0.0]
//!     .into_iter()
//!     .enumerate()
//!     .map(|(time, x)| (time as f64, HashMap::from([("X", x)])))
//!     .collect();
//!
//! assert!(check_formula("F[X,1,1] & FG[X,0,0]", &trace)?);
//! assert!(!check_formula("G[X,0,0]", &trace)?);
//! # Ok::<(), tra::checker::CheckError>(())
//! ```

pub mod chain;
pub mod checker;
pub mod config;
pub mod formula;
pub mod model;
pub mod parser;
pub mod pattern;
pub mod predicate;
pub mod property;
pub mod quantity;
pub mod simulator;
pub mod trace;
pub mod truth;

pub use crate::checker::{check_trace, CheckError, ModelChecker, Status};
pub use crate::config::CheckConfig;
pub use crate::formula::Formula;
pub use crate::parser::parse_formula;
pub use crate::pattern::{PatternKind, PatternValue, TemporalPattern};
pub use crate::property::{PropertyCheckError, PropertyCheckResult, PropertyChecker};
pub use crate::trace::Trace;
pub use crate::truth::Truth;

/// Parse a formula string and decide it over a complete trace.
pub fn check_formula<State>(formula: &str, trace: &Trace<State>) -> Result<bool, CheckError>
where
    State: predicate::VariableSet,
{
    let formula = parse_formula(formula)?;
    check_trace(&formula, trace)
}
