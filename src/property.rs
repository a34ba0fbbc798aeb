//! Repeated-simulation checking of temporal patterns.
//!
//! A [`PropertyChecker`] answers whether a pattern holds for a model by simulating the model a
//! fixed number of times and checking each run on its own. The answer is a satisfaction rate
//! rather than a single boolean since every run is stochastic.
//!
//! One check proceeds as follows:
//!
//! 1. The caller's model is cloned. Everything below happens on the clone.
//! 2. The monitored entity is resolved into a monomer and site pattern, and the matching
//!    observable is created. An entity the model does not contain is an error.
//! 3. Conditions are applied to the initial amounts of their entities.
//! 4. The pattern is compiled and every run is downsampled, discretized and checked.
//! 5. The rate of satisfying runs is reported, along with an alternative pattern when the rate
//!    counts as a failure.

use std::error::Error;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::checker::{check_trace, CheckError};
use crate::config::{CheckConfig, ConfigError};
use crate::model::{EntityResolver, Model, ModelAssembler, ModelError, NameResolver};
use crate::pattern::{InvalidTimeIntervalError, PatternKind, TemporalPattern};
use crate::predicate::{BoundsError, EvaluationError};
use crate::quantity::MolecularCondition;
use crate::simulator::{SimulationSettings, Simulator, SimulatorError};

#[derive(Debug, Error)]
pub enum PropertyCheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    TimeInterval(#[from] InvalidTimeIntervalError),

    #[error("Error building pattern formula: {0}")]
    Formula(#[from] BoundsError),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error("Simulation trace is missing the observable: {0}")]
    Observable(#[from] EvaluationError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("Error assembling model: {0}")]
    Assembly(#[source] Box<dyn Error + Send + Sync>),
}

/// Outcome of a property check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyCheckResult {
    /// Fraction of runs in which the pattern held, in `[0, 1]`.
    pub satisfaction_rate: f64,
    pub num_simulations: usize,
    /// Alternative pattern worth checking when this one failed.
    pub suggestion: Option<PatternKind>,
}

pub struct PropertyChecker<S, R = NameResolver> {
    simulator: S,
    resolver: R,
    config: CheckConfig,
}

impl<S> PropertyChecker<S>
where
    S: Simulator,
{
    pub fn new(simulator: S) -> Self {
        Self {
            simulator,
            resolver: NameResolver,
            config: CheckConfig::default(),
        }
    }
}

impl<S, R> PropertyChecker<S, R>
where
    S: Simulator,
    R: EntityResolver,
{
    pub fn with_resolver<T: EntityResolver>(self, resolver: T) -> PropertyChecker<S, T> {
        PropertyChecker {
            simulator: self.simulator,
            resolver,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: CheckConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn into_simulator(self) -> S {
        self.simulator
    }

    fn apply_condition(&self, model: &mut Model, condition: &MolecularCondition) -> Result<(), ModelError> {
        let entity = &condition.quantity().entity;
        let (monomer, sites) = self.resolver.resolve(entity);
        let parameter = model.monomer(&monomer)?.initial_parameter();

        if !sites.is_empty() {
            warn!(%entity, parameter, "Condition on a modified monomer applied to its base initial amount");
        }

        let amount = model.parameter_mut(&parameter)?;
        *amount = condition.apply(*amount, self.config.increase_factor, self.config.decrease_factor);

        debug!(parameter, amount = *amount, "Applied condition");
        Ok(())
    }

    /// Estimate how often `pattern` holds for `model` under `conditions`.
    ///
    /// The caller's model is never modified. Errors raised while resolving the pattern or running
    /// a simulation abort the check; they are never reported as a failed pattern.
    pub fn check_property(
        &mut self,
        model: &Model,
        pattern: &TemporalPattern,
        conditions: &[MolecularCondition],
    ) -> Result<PropertyCheckResult, PropertyCheckError> {
        self.config.validate()?;

        let mut model = model.clone();
        let (monomer, sites) = self.resolver.resolve(pattern.entity());
        let observable = model.get_or_create_observable(&monomer, &sites)?;

        for condition in conditions {
            self.apply_condition(&mut model, condition)?;
        }

        let compiled = pattern.compile(observable, self.config.threshold, self.config.tolerance)?;
        let window = pattern.time_limit();
        let start = window.and_then(|interval| interval.lower_seconds());
        let max_time = window
            .and_then(|interval| interval.upper_seconds())
            .unwrap_or(self.config.max_time);

        if let Some(interval) = window {
            interval.check_horizon(max_time)?;
        }

        let settings = SimulationSettings::new(max_time, self.config.num_time_points);

        info!(
            pattern = %pattern.kind(),
            observable = compiled.observable(),
            formula = %compiled.formula(),
            runs = self.config.num_simulations,
            max_time,
            "Checking property"
        );

        let mut satisfied = 0usize;

        for run in 0..self.config.num_simulations {
            let mut trace = self.simulator.simulate(&model, &settings)?;

            if let Some(start) = start {
                trace = trace.starting_at(start);
            }

            let discrete = compiled.discretize(&trace.downsample(self.config.downsample))?;
            let holds = check_trace(compiled.formula(), &discrete)?;

            debug!(run, holds, samples = discrete.len(), "Checked simulation run");

            if holds {
                satisfied += 1;
            }
        }

        let num_simulations = self.config.num_simulations;
        let satisfaction_rate = satisfied as f64 / num_simulations as f64;
        let failed = satisfaction_rate == 0.0 || satisfaction_rate < self.config.failure_rate;
        let suggestion = if failed {
            pattern.kind().suggest_alternative()
        } else {
            None
        };

        info!(satisfaction_rate, num_simulations, suggestion = ?suggestion, "Property check complete");

        Ok(PropertyCheckResult {
            satisfaction_rate,
            num_simulations,
            suggestion,
        })
    }

    /// Assemble a model from statements and check a pattern against it.
    pub fn check_statements<A>(
        &mut self,
        assembler: &A,
        statements: &[A::Statement],
        pattern: &TemporalPattern,
        conditions: &[MolecularCondition],
    ) -> Result<PropertyCheckResult, PropertyCheckError>
    where
        A: ModelAssembler,
    {
        let model = assembler
            .assemble(statements)
            .map_err(|error| PropertyCheckError::Assembly(Box::new(error)))?;

        self.check_property(&model, pattern, conditions)
    }
}
