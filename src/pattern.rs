//! Named qualitative patterns and their compilation into formulas.
//!
//! A [`TemporalPattern`] describes the shape the trajectory of one entity should have over time.
//! Compiling a pattern produces a [`Formula`] over the single boolean variable [`VARIABLE`] along
//! with the [`Discretization`] that turns the raw trajectory of the monitored observable into the
//! 0/1 values of that variable.
//!
//! | pattern          | formula                |
//! | ---------------- | ---------------------- |
//! | `transient`      | `F[X,1,1] & FG[X,0,0]` |
//! | `sustained`      | `FG[X,1,1]`            |
//! | `no_change`      | `G[X,0,0]`             |
//! | `always_value`   | `G[X,v,v]`             |
//! | `eventual_value` | `FG[X,v,v]`            |
//! | `sometime_value` | `F[X,v,v]`             |
//!
//! ```rust
//! use tra::model::Entity;
//! use tra::pattern::{Level, PatternKind, PatternValue, TemporalPattern};
//!
//! let pattern = TemporalPattern::new(
//!     PatternKind::EventualValue,
//!     vec![Entity::new("ERK")],
//!     Some(PatternValue::Qualitative(Level::High)),
//!     None,
//! )?;
//!
//! let compiled = pattern.compile("ERK_obs", 50.0, 0.1)?;
//! assert_eq!(compiled.formula().to_string(), "FG[X,1,1]");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formula::Formula;
use crate::model::Entity;
use crate::predicate::{BoundsError, EvaluationError, VariableSet};
use crate::trace::Trace;

/// Name of the boolean variable every compiled pattern formula is written over.
pub const VARIABLE: &str = "X";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Discretized value of the level.
    pub fn as_value(self) -> f64 {
        match self {
            Self::Low => 0.0,
            Self::High => 1.0,
        }
    }
}

impl FromStr for Level {
    type Err = InvalidTemporalPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            _ => Err(InvalidTemporalPatternError::UnknownLevel(s.to_string())),
        }
    }
}

/// Target value of the `*_value` patterns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternValue {
    Qualitative(Level),
    Numeric(f64),
}

impl From<Level> for PatternValue {
    fn from(level: Level) -> Self {
        Self::Qualitative(level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Transient,
    Sustained,
    NoChange,
    AlwaysValue,
    EventualValue,
    SometimeValue,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Sustained => "sustained",
            Self::NoChange => "no_change",
            Self::AlwaysValue => "always_value",
            Self::EventualValue => "eventual_value",
            Self::SometimeValue => "sometime_value",
        }
    }

    /// Returns `true` for the patterns that compare against a target value.
    pub fn requires_value(self) -> bool {
        matches!(self, Self::AlwaysValue | Self::EventualValue | Self::SometimeValue)
    }

    /// Pattern to propose when this one does not hold.
    ///
    /// The value patterns weaken in order `always_value`, `eventual_value`, `sometime_value`;
    /// the shape patterns point at their closest alternative. `sometime_value` is the weakest
    /// pattern and has no alternative.
    pub fn suggest_alternative(self) -> Option<PatternKind> {
        match self {
            Self::AlwaysValue => Some(Self::EventualValue),
            Self::EventualValue => Some(Self::SometimeValue),
            Self::SometimeValue => None,
            Self::Sustained => Some(Self::Transient),
            Self::Transient => Some(Self::Sustained),
            Self::NoChange => Some(Self::Transient),
        }
    }
}

impl Display for PatternKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternKind {
    type Err = InvalidTemporalPatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim() {
            "transient" => Self::Transient,
            "sustained" => Self::Sustained,
            "no_change" => Self::NoChange,
            "always_value" => Self::AlwaysValue,
            "eventual_value" => Self::EventualValue,
            "sometime_value" => Self::SometimeValue,
            _ => return Err(InvalidTemporalPatternError::UnknownKind(s.to_string())),
        };

        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidTemporalPatternError {
    #[error("Unknown pattern type \"{0}\"")]
    UnknownKind(String),

    #[error("Unknown qualitative value \"{0}\"")]
    UnknownLevel(String),

    #[error("Pattern has no entities")]
    NoEntities,

    #[error("Patterns over {0} entities are not supported")]
    MultipleEntities(usize),

    #[error("Pattern {0} requires a target value")]
    MissingValue(PatternKind),

    #[error("Invalid target value {0}")]
    InvalidValue(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidTimeIntervalError {
    #[error("Unknown time unit \"{0}\"")]
    UnknownUnit(String),

    #[error("Time bound {0} must be finite and non-negative")]
    InvalidBound(f64),

    #[error("Lower time bound {lower} exceeds upper bound {upper}")]
    Inverted { lower: f64, upper: f64 },

    #[error("Time window must end after time 0")]
    EmptyHorizon,

    #[error("Time window starts at {start} s, after the simulation ends at {horizon} s")]
    StartsAfterHorizon { start: f64, horizon: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    pub fn seconds(self) -> f64 {
        match self {
            Self::Second => 1.0,
            Self::Minute => 60.0,
            Self::Hour => 3600.0,
            Self::Day => 86400.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = InvalidTimeIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "second" | "seconds" => Ok(Self::Second),
            "min" | "minute" | "minutes" => Ok(Self::Minute),
            "h" | "hour" | "hours" => Ok(Self::Hour),
            "d" | "day" | "days" => Ok(Self::Day),
            _ => Err(InvalidTimeIntervalError::UnknownUnit(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct RawInterval {
    lower: Option<f64>,
    upper: Option<f64>,
    #[serde(default)]
    unit: TimeUnit,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = InvalidTimeIntervalError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.lower, raw.upper, raw.unit)
    }
}

/// Window of time a pattern is required to hold in. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    lower: Option<f64>,
    upper: Option<f64>,
    unit: TimeUnit,
}

impl TimeInterval {
    pub fn new(lower: Option<f64>, upper: Option<f64>, unit: TimeUnit) -> Result<Self, InvalidTimeIntervalError> {
        for bound in lower.iter().chain(upper.iter()) {
            if !bound.is_finite() || *bound < 0.0 {
                return Err(InvalidTimeIntervalError::InvalidBound(*bound));
            }
        }

        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return Err(InvalidTimeIntervalError::Inverted { lower, upper });
            }
        }

        Ok(Self { lower, upper, unit })
    }

    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    pub fn upper(&self) -> Option<f64> {
        self.upper
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn lower_seconds(&self) -> Option<f64> {
        self.lower.map(|bound| bound * self.unit.seconds())
    }

    pub fn upper_seconds(&self) -> Option<f64> {
        self.upper.map(|bound| bound * self.unit.seconds())
    }

    /// Check that the window leaves samples to look at in a simulation ending at `horizon`
    /// seconds.
    pub fn check_horizon(&self, horizon: f64) -> Result<(), InvalidTimeIntervalError> {
        if horizon <= 0.0 {
            return Err(InvalidTimeIntervalError::EmptyHorizon);
        }

        match self.lower_seconds() {
            Some(start) if start > horizon => Err(InvalidTimeIntervalError::StartsAfterHorizon { start, horizon }),
            _ => Ok(()),
        }
    }
}

/// Mapping from raw observable values to the 0/1 values of [`VARIABLE`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Discretization {
    /// High strictly above the threshold.
    Threshold(f64),
    /// High within `tolerance * |center|` of the center, or within `tolerance` when the center
    /// is zero.
    Band { center: f64, tolerance: f64 },
}

impl Discretization {
    pub fn classify(&self, value: f64) -> f64 {
        let high = match *self {
            Self::Threshold(threshold) => value > threshold,
            Self::Band { center, tolerance } => {
                let width = if center == 0.0 { tolerance } else { tolerance * center.abs() };
                (value - center).abs() <= width
            }
        };

        if high {
            1.0
        } else {
            0.0
        }
    }
}

/// A pattern ready to be checked against simulation traces.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPattern {
    formula: Formula,
    observable: String,
    discretization: Discretization,
}

impl CompiledPattern {
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn observable(&self) -> &str {
        &self.observable
    }

    pub fn discretization(&self) -> Discretization {
        self.discretization
    }

    /// Extract the monitored observable from every sample of a simulation trace and discretize
    /// it into a trace over [`VARIABLE`].
    pub fn discretize<State>(&self, trace: &Trace<State>) -> Result<Trace<HashMap<&'static str, f64>>, EvaluationError>
    where
        State: VariableSet,
    {
        trace
            .iter()
            .map(|(time, state)| {
                let value = state
                    .value_for(&self.observable)
                    .ok_or_else(|| EvaluationError::missing(&self.observable))?;

                if value.is_nan() {
                    return Err(EvaluationError::nan_value(&self.observable));
                }

                Ok((time, HashMap::from([(VARIABLE, self.discretization.classify(value))])))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemporalPattern {
    kind: PatternKind,
    entities: NonEmpty<Entity>,
    value: Option<PatternValue>,
    time_limit: Option<TimeInterval>,
}

impl TemporalPattern {
    pub fn new(
        kind: PatternKind,
        entities: Vec<Entity>,
        value: Option<PatternValue>,
        time_limit: Option<TimeInterval>,
    ) -> Result<Self, InvalidTemporalPatternError> {
        let entities = NonEmpty::from_vec(entities).ok_or(InvalidTemporalPatternError::NoEntities)?;

        if entities.len() > 1 {
            return Err(InvalidTemporalPatternError::MultipleEntities(entities.len()));
        }

        match value {
            None if kind.requires_value() => return Err(InvalidTemporalPatternError::MissingValue(kind)),
            Some(PatternValue::Numeric(number)) if !number.is_finite() || number < 0.0 => {
                return Err(InvalidTemporalPatternError::InvalidValue(number))
            }
            _ => {}
        }

        Ok(Self {
            kind,
            entities,
            value,
            time_limit,
        })
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// The monitored entity.
    pub fn entity(&self) -> &Entity {
        self.entities.first()
    }

    pub fn entities(&self) -> &NonEmpty<Entity> {
        &self.entities
    }

    pub fn value(&self) -> Option<PatternValue> {
        self.value
    }

    pub fn time_limit(&self) -> Option<&TimeInterval> {
        self.time_limit.as_ref()
    }

    fn target(&self, threshold: f64, tolerance: f64) -> (f64, Discretization) {
        match self.value {
            Some(PatternValue::Numeric(center)) => (1.0, Discretization::Band { center, tolerance }),
            Some(PatternValue::Qualitative(level)) => (level.as_value(), Discretization::Threshold(threshold)),
            None => (1.0, Discretization::Threshold(threshold)),
        }
    }

    /// Build the formula for this pattern over [`VARIABLE`], monitoring `observable`.
    pub fn compile(
        &self,
        observable: impl Into<String>,
        threshold: f64,
        tolerance: f64,
    ) -> Result<CompiledPattern, BoundsError> {
        let (target, discretization) = self.target(threshold, tolerance);

        let formula = match self.kind {
            PatternKind::Transient => Formula::and(
                Formula::eventually(Formula::exact(VARIABLE, 1.0)?),
                Formula::eventually(Formula::always(Formula::exact(VARIABLE, 0.0)?)),
            ),
            PatternKind::Sustained => Formula::eventually(Formula::always(Formula::exact(VARIABLE, 1.0)?)),
            PatternKind::NoChange => Formula::always(Formula::exact(VARIABLE, 0.0)?),
            PatternKind::AlwaysValue => Formula::always(Formula::exact(VARIABLE, target)?),
            PatternKind::EventualValue => Formula::eventually(Formula::always(Formula::exact(VARIABLE, target)?)),
            PatternKind::SometimeValue => Formula::eventually(Formula::exact(VARIABLE, target)?),
        };

        Ok(CompiledPattern {
            formula,
            observable: observable.into(),
            discretization,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::error::Error;

    use super::{
        Discretization, InvalidTemporalPatternError, InvalidTimeIntervalError, Level, PatternKind, PatternValue,
        TemporalPattern, TimeInterval, TimeUnit,
    };
    use crate::model::Entity;
    use crate::trace::Trace;

    fn pattern(kind: PatternKind, value: Option<PatternValue>) -> Result<TemporalPattern, InvalidTemporalPatternError> {
        TemporalPattern::new(kind, vec![Entity::new("ERK")], value, None)
    }

    #[test]
    fn compiled_formulas() -> Result<(), Box<dyn Error>> {
        let high = Some(PatternValue::Qualitative(Level::High));
        let low = Some(PatternValue::Qualitative(Level::Low));
        let cases = [
            (PatternKind::Transient, None, "F[X,1,1] & FG[X,0,0]"),
            (PatternKind::Sustained, None, "FG[X,1,1]"),
            (PatternKind::NoChange, None, "G[X,0,0]"),
            (PatternKind::AlwaysValue, low, "G[X,0,0]"),
            (PatternKind::EventualValue, high, "FG[X,1,1]"),
            (PatternKind::SometimeValue, Some(PatternValue::Numeric(25.0)), "F[X,1,1]"),
        ];

        for (kind, value, expected) in cases {
            let compiled = pattern(kind, value)?.compile("ERK_obs", 50.0, 0.1)?;
            assert_eq!(compiled.formula().to_string(), expected);
            assert_eq!(compiled.observable(), "ERK_obs");
        }

        Ok(())
    }

    #[test]
    fn pattern_validation() {
        assert_eq!(
            pattern(PatternKind::AlwaysValue, None),
            Err(InvalidTemporalPatternError::MissingValue(PatternKind::AlwaysValue))
        );
        assert!(matches!(
            pattern(PatternKind::SometimeValue, Some(PatternValue::Numeric(f64::NAN))),
            Err(InvalidTemporalPatternError::InvalidValue(_))
        ));
        assert_eq!(
            TemporalPattern::new(PatternKind::Sustained, Vec::new(), None, None),
            Err(InvalidTemporalPatternError::NoEntities)
        );
        assert_eq!(
            TemporalPattern::new(PatternKind::Sustained, vec![Entity::new("A"), Entity::new("B")], None, None),
            Err(InvalidTemporalPatternError::MultipleEntities(2))
        );
        assert!("sometimes".parse::<PatternKind>().is_err());
        assert!("medium".parse::<Level>().is_err());
    }

    #[test]
    fn kind_names() -> Result<(), InvalidTemporalPatternError> {
        for name in ["transient", "sustained", "no_change", "always_value", "eventual_value", "sometime_value"] {
            assert_eq!(name.parse::<PatternKind>()?.to_string(), name);
        }

        Ok(())
    }

    #[test]
    fn suggestions_weaken_value_patterns() {
        assert_eq!(PatternKind::AlwaysValue.suggest_alternative(), Some(PatternKind::EventualValue));
        assert_eq!(PatternKind::EventualValue.suggest_alternative(), Some(PatternKind::SometimeValue));
        assert_eq!(PatternKind::SometimeValue.suggest_alternative(), None);
        assert_eq!(PatternKind::NoChange.suggest_alternative(), Some(PatternKind::Transient));
    }

    #[test]
    fn time_intervals() -> Result<(), InvalidTimeIntervalError> {
        let interval = TimeInterval::new(Some(0.0), Some(2.0), "hours".parse()?)?;

        assert_eq!(interval.unit(), TimeUnit::Hour);
        assert_eq!(interval.upper_seconds(), Some(7200.0));
        assert_eq!(
            TimeInterval::new(Some(5.0), Some(1.0), TimeUnit::Second),
            Err(InvalidTimeIntervalError::Inverted { lower: 5.0, upper: 1.0 })
        );
        assert!(TimeInterval::new(None, Some(-1.0), TimeUnit::Minute).is_err());
        assert!("fortnight".parse::<TimeUnit>().is_err());

        assert_eq!(interval.check_horizon(7200.0), Ok(()));
        assert_eq!(
            TimeInterval::new(Some(10.0), None, TimeUnit::Hour)?.check_horizon(20000.0),
            Err(InvalidTimeIntervalError::StartsAfterHorizon {
                start: 36000.0,
                horizon: 20000.0
            })
        );
        assert_eq!(
            TimeInterval::new(None, Some(0.0), TimeUnit::Second)?.check_horizon(0.0),
            Err(InvalidTimeIntervalError::EmptyHorizon)
        );

        Ok(())
    }

    #[test]
    fn deserialized_intervals_are_validated() -> Result<(), serde_json::Error> {
        let interval: TimeInterval = serde_json::from_str(r#"{ "lower": 1.0, "upper": 3.0, "unit": "minute" }"#)?;

        assert_eq!(interval.upper_seconds(), Some(180.0));
        assert!(serde_json::from_str::<TimeInterval>(r#"{ "lower": 5.0, "upper": 1.0 }"#).is_err());
        assert!(serde_json::from_str::<TimeInterval>(r#"{ "lower": -1.0, "upper": null }"#).is_err());

        Ok(())
    }

    #[test]
    fn discretization() -> Result<(), Box<dyn Error>> {
        assert_eq!(Discretization::Threshold(50.0).classify(50.0), 0.0);
        assert_eq!(Discretization::Threshold(50.0).classify(50.5), 1.0);

        let band = Discretization::Band {
            center: 100.0,
            tolerance: 0.1,
        };
        assert_eq!(band.classify(95.0), 1.0);
        assert_eq!(band.classify(111.0), 0.0);

        let compiled = pattern(PatternKind::Sustained, None)?.compile("ERK_obs", 50.0, 0.1)?;
        let trace = Trace::from([
            (0.0, HashMap::from([("ERK_obs", 10.0)])),
            (1.0, HashMap::from([("ERK_obs", 80.0)])),
        ]);
        let discrete = compiled.discretize(&trace)?;

        assert_eq!(discrete[0.0]["X"], 0.0);
        assert_eq!(discrete[1.0]["X"], 1.0);

        let unrelated = Trace::from([(0.0, HashMap::from([("MEK_obs", 10.0)]))]);
        assert!(compiled.discretize(&unrelated).is_err());

        Ok(())
    }
}
