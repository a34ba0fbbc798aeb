//! The boundary with the stochastic simulation backend.

use std::collections::HashMap;

use thiserror::Error;

use crate::model::Model;
use crate::trace::Trace;

/// Samples of every observable of a model, keyed by observable name.
pub type SimulationTrace = Trace<HashMap<String, f64>>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    #[error("Simulator unavailable: {0}")]
    Unavailable(String),

    #[error("Simulation failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// End of the simulated time span in seconds.
    pub max_time: f64,
    /// Number of evenly spaced samples to return, including time 0.
    pub num_time_points: usize,
}

impl SimulationSettings {
    pub fn new(max_time: f64, num_time_points: usize) -> Self {
        Self {
            max_time,
            num_time_points,
        }
    }

    /// Sampling times requested from the simulator.
    pub fn time_points(&self) -> impl Iterator<Item = f64> + '_ {
        let steps = self.num_time_points.saturating_sub(1).max(1) as f64;
        (0..self.num_time_points).map(move |index| self.max_time * index as f64 / steps)
    }
}

/// A backend producing one stochastic trajectory of a model per call.
///
/// Calls block until the run completes. Implementations are invoked repeatedly with the same
/// settings and must return a finite, time-ordered trace holding a value for every observable of
/// the model at each sample.
pub trait Simulator {
    fn simulate(&mut self, model: &Model, settings: &SimulationSettings) -> Result<SimulationTrace, SimulatorError>;
}

impl<S> Simulator for &mut S
where
    S: Simulator + ?Sized,
{
    fn simulate(&mut self, model: &Model, settings: &SimulationSettings) -> Result<SimulationTrace, SimulatorError> {
        (**self).simulate(model, settings)
    }
}

impl<S> Simulator for Box<S>
where
    S: Simulator + ?Sized,
{
    fn simulate(&mut self, model: &Model, settings: &SimulationSettings) -> Result<SimulationTrace, SimulatorError> {
        (**self).simulate(model, settings)
    }
}
