//! Incremental model checking of a formula against a streaming trace.
//!
//! A [`ModelChecker`] is a two-state machine. It starts out [`Status::Evaluating`] with a chain of
//! a single link and, on every sample, pushes the sample into the head of the chain, evaluates
//! the formula from position 0 and either becomes [`Status::Decided`] or grows the chain by one
//! link to wait for the next sample.
//!
//! # End of trace
//!
//! A trace may end with the root formula still undetermined, for example when the caller runs
//! out of samples without flagging the last one. [`ModelChecker::finish`] closes the chain at the
//! last sampled link and re-evaluates. Should the root still be unknown after that, the checker
//! decides `false`: a formula is never reported as satisfied because the data ran out.
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use tra::checker::{ModelChecker, Status};
//!
//! let mut checker: ModelChecker = "G[X,0,0]".parse()?;
//!
//! checker.update(&HashMap::from([("X", 0.0)]), false)?;
//! assert_eq!(checker.status(), Status::Evaluating);
//!
//! checker.update(&HashMap::from([("X", 1.0)]), false)?;
//! assert_eq!(checker.status(), Status::Decided(false));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::chain::FormulaChain;
use crate::formula::Formula;
use crate::parser::{parse_formula, ParseError};
use crate::predicate::{EvaluationError, VariableSet};
use crate::trace::Trace;
use crate::truth::Truth;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    #[error("Empty trace")]
    EmptyTrace,

    #[error("Error parsing formula: {0}")]
    Parse(#[from] ParseError),

    #[error("At time {time} encountered error: {error}")]
    Evaluation {
        time: f64,
        #[source]
        error: EvaluationError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The root formula is still undetermined.
    Evaluating,
    /// The root formula has been resolved.
    Decided(bool),
}

impl Status {
    pub fn is_decided(self) -> bool {
        matches!(self, Self::Decided(_))
    }
}

/// Incremental checker for a single formula.
#[derive(Debug, Clone)]
pub struct ModelChecker {
    formula: Formula,
    chain: FormulaChain,
    status: Status,
}

impl ModelChecker {
    pub fn new(formula: Formula) -> Self {
        let chain = FormulaChain::new(&formula);

        Self {
            formula,
            chain,
            status: Status::Evaluating,
        }
    }

    /// Stop growing the chain after `limit` samples; the sample at position `limit - 1` is
    /// treated as the last one.
    pub fn with_time_limit(mut self, limit: usize) -> Self {
        self.chain = self.chain.with_limit(limit);
        self
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Current three-valued truth of the formula at the start of the trace.
    pub fn truth(&self) -> Truth {
        match self.status {
            Status::Decided(value) => Truth::from(value),
            Status::Evaluating => Truth::Unknown,
        }
    }

    /// Number of time steps the formula has been unrolled over.
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Push one sample and advance the state machine.
    ///
    /// Once the checker is decided further samples are ignored and the decided status is
    /// returned unchanged.
    pub fn update<State>(&mut self, state: &State, is_last: bool) -> Result<Status, EvaluationError>
    where
        State: VariableSet + ?Sized,
    {
        if self.status.is_decided() {
            return Ok(self.status);
        }

        self.chain.update(state, is_last)?;

        match self.chain.eval() {
            Truth::True => self.decide(true),
            Truth::False => self.decide(false),
            Truth::Unknown if self.chain.is_closed() => self.decide(false),
            Truth::Unknown => {
                self.chain.extend();
                debug!(links = self.chain.len(), "Extended formula chain");
            }
        }

        Ok(self.status)
    }

    /// Resolve the formula for a trace that ended without a sample flagged as last.
    pub fn finish(&mut self) -> bool {
        if let Status::Decided(value) = self.status {
            return value;
        }

        self.chain.close();

        let value = self.chain.eval() == Truth::True;
        self.decide(value);

        value
    }

    fn decide(&mut self, value: bool) {
        debug!(links = self.chain.len(), value, "Formula decided");
        self.status = Status::Decided(value);
    }

    /// Feed every sample of a trace, flagging the final one, and return the decided value.
    pub fn check<State>(&mut self, trace: &Trace<State>) -> Result<bool, CheckError>
    where
        State: VariableSet,
    {
        if trace.is_empty() {
            return Err(CheckError::EmptyTrace);
        }

        let count = trace.len();

        for (index, (time, state)) in trace.iter().enumerate() {
            let status = self
                .update(state, index + 1 == count)
                .map_err(|error| CheckError::Evaluation { time, error })?;

            if status.is_decided() {
                break;
            }
        }

        Ok(self.finish())
    }
}

impl FromStr for ModelChecker {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s).map(Self::new)
    }
}

/// Decide a formula over a complete trace.
pub fn check_trace<State>(formula: &Formula, trace: &Trace<State>) -> Result<bool, CheckError>
where
    State: VariableSet,
{
    ModelChecker::new(formula.clone()).check(trace)
}
