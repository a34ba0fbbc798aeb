//! Settings of a property check.
//!
//! Every field has a default, so a JSON document only needs to name the values it changes:
//!
//! ```rust
//! use tra::CheckConfig;
//!
//! let config = CheckConfig::from_json_str(r#"{ "num_simulations": 20, "threshold": 10.0 }"#)?;
//!
//! assert_eq!(config.num_simulations, 20);
//! assert_eq!(config.num_time_points, 100);
//! # Ok::<(), tra::config::ConfigError>(())
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error decoding configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Number of independent simulation runs per check.
    pub num_simulations: usize,
    /// Simulated time span in seconds, unless the pattern carries a time limit.
    pub max_time: f64,
    pub num_time_points: usize,
    /// Keep every n-th sample of a simulated trace before checking it.
    pub downsample: usize,
    /// Observable values strictly above the threshold count as high.
    pub threshold: f64,
    /// Relative half width of the band around numeric target values.
    pub tolerance: f64,
    /// Satisfaction rates strictly below this value come with a suggested alternative pattern.
    pub failure_rate: f64,
    pub increase_factor: f64,
    pub decrease_factor: f64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            num_simulations: 10,
            max_time: 20000.0,
            num_time_points: 100,
            downsample: 1,
            threshold: 50.0,
            tolerance: 0.1,
            failure_rate: 0.5,
            increase_factor: 2.0,
            decrease_factor: 0.5,
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

impl CheckConfig {
    pub fn with_num_simulations(mut self, num_simulations: usize) -> Self {
        self.num_simulations = num_simulations;
        self
    }

    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.max_time = max_time;
        self
    }

    pub fn with_num_time_points(mut self, num_time_points: usize) -> Self {
        self.num_time_points = num_time_points;
        self
    }

    pub fn with_downsample(mut self, downsample: usize) -> Self {
        self.downsample = downsample;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = failure_rate;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_simulations == 0 {
            return Err(invalid("num_simulations must be at least 1"));
        }

        if self.num_time_points == 0 {
            return Err(invalid("num_time_points must be at least 1"));
        }

        if self.downsample == 0 {
            return Err(invalid("downsample must be at least 1"));
        }

        if !self.max_time.is_finite() || self.max_time <= 0.0 {
            return Err(invalid(format!("max_time must be positive, got {}", self.max_time)));
        }

        if !self.threshold.is_finite() {
            return Err(invalid("threshold must be finite"));
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(invalid(format!("tolerance must be non-negative, got {}", self.tolerance)));
        }

        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(invalid(format!("failure_rate must lie in [0, 1], got {}", self.failure_rate)));
        }

        for (name, factor) in [("increase_factor", self.increase_factor), ("decrease_factor", self.decrease_factor)] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(invalid(format!("{} must be positive, got {}", name, factor)));
            }
        }

        Ok(())
    }

    /// Decode and validate a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckConfig, ConfigError};

    #[test]
    fn defaults_are_valid() -> Result<(), ConfigError> {
        let config = CheckConfig::default();

        config.validate()?;
        assert_eq!(CheckConfig::from_json_str("{}")?, config);

        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            CheckConfig::default().with_num_simulations(0),
            CheckConfig::default().with_num_time_points(0),
            CheckConfig::default().with_downsample(0),
            CheckConfig::default().with_max_time(f64::INFINITY),
            CheckConfig::default().with_tolerance(-0.1),
            CheckConfig::default().with_failure_rate(1.5),
        ];

        for config in cases {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn json_errors() {
        assert!(matches!(CheckConfig::from_json_str("{ \"threshold\": \"high\" }"), Err(ConfigError::Json(_))));
        assert!(matches!(CheckConfig::from_json_str("{ \"downsample\": 0 }"), Err(ConfigError::Invalid(_))));
        assert!(matches!(CheckConfig::from_path("/nonexistent/tra.json"), Err(ConfigError::Io(_))));
    }
}
