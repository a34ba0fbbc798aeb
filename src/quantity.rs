//! Molecular amounts and the perturbation conditions built from them.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::character::complete::space0;
use nom::number::complete::double;
use nom::sequence::terminated;
use nom::IResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Entity;
use crate::pattern::Level;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidMolecularQuantityError {
    #[error("Unknown quantity type \"{0}\"")]
    UnknownType(String),

    #[error("Invalid concentration \"{0}\"")]
    InvalidConcentration(String),

    #[error("Unknown concentration unit \"{0}\"")]
    UnknownUnit(String),

    #[error("Invalid molecule count \"{0}\"")]
    InvalidNumber(String),

    #[error("Invalid qualitative amount \"{0}\"")]
    InvalidQualitative(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidMolecularConditionError {
    #[error("Unknown condition type \"{0}\"")]
    UnknownType(String),

    #[error("Exact conditions require a molecule count, got {0}")]
    NonNumericExact(MolecularQuantity),

    #[error("Invalid multiplicative factor {0}")]
    InvalidFactor(f64),

    #[error("Unknown quantity reference \"{0}\"")]
    UnknownReference(String),

    #[error("Conditions apply to initial amounts, not to the total amount of {0}")]
    NotInitial(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcentrationUnit {
    Molar,
    Millimolar,
    Micromolar,
    Nanomolar,
}

impl ConcentrationUnit {
    /// Size of the unit in molar.
    pub fn molar(self) -> f64 {
        match self {
            Self::Molar => 1.0,
            Self::Millimolar => 1e-3,
            Self::Micromolar => 1e-6,
            Self::Nanomolar => 1e-9,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Molar => "M",
            Self::Millimolar => "mM",
            Self::Micromolar => "uM",
            Self::Nanomolar => "nM",
        }
    }
}

impl FromStr for ConcentrationUnit {
    type Err = InvalidMolecularQuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" | "mol/L" => Ok(Self::Molar),
            "mM" | "mmol/L" => Ok(Self::Millimolar),
            "uM" | "µM" | "umol/L" => Ok(Self::Micromolar),
            "nM" | "nmol/L" => Ok(Self::Nanomolar),
            _ => Err(InvalidMolecularQuantityError::UnknownUnit(s.to_string())),
        }
    }
}

/// An amount of a molecular species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MolecularQuantity {
    Concentration { value: f64, unit: ConcentrationUnit },
    Number(u64),
    Qualitative(Level),
}

impl MolecularQuantity {
    /// Parse a quantity of the given type: `concentration` (e.g. `"10 nM"`), `number` (a
    /// non-negative integer) or `qualitative` (`low` or `high`).
    pub fn parse(quantity: &str, kind: &str) -> Result<Self, InvalidMolecularQuantityError> {
        let quantity = quantity.trim();

        match kind {
            "concentration" => {
                let parsed: IResult<&str, f64> = terminated(double, space0)(quantity);
                let (unit, value) =
                    parsed.map_err(|_| InvalidMolecularQuantityError::InvalidConcentration(quantity.to_string()))?;

                if !value.is_finite() || value < 0.0 {
                    return Err(InvalidMolecularQuantityError::InvalidConcentration(quantity.to_string()));
                }

                Ok(Self::Concentration {
                    value,
                    unit: unit.trim_end().parse()?,
                })
            }
            "number" => quantity
                .parse()
                .map(Self::Number)
                .map_err(|_| InvalidMolecularQuantityError::InvalidNumber(quantity.to_string())),
            "qualitative" => quantity
                .parse()
                .map(Self::Qualitative)
                .map_err(|_| InvalidMolecularQuantityError::InvalidQualitative(quantity.to_string())),
            _ => Err(InvalidMolecularQuantityError::UnknownType(kind.to_string())),
        }
    }

    /// Concentration in molar, if this is a concentration.
    pub fn molar(&self) -> Option<f64> {
        match self {
            Self::Concentration { value, unit } => Some(value * unit.molar()),
            _ => None,
        }
    }
}

impl Display for MolecularQuantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concentration { value, unit } => write!(f, "{} {}", value, unit.symbol()),
            Self::Number(count) => write!(f, "{}", count),
            Self::Qualitative(Level::Low) => f.write_str("low"),
            Self::Qualitative(Level::High) => f.write_str("high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Total,
    Initial,
}

impl FromStr for ReferenceKind {
    type Err = InvalidMolecularConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(Self::Total),
            "initial" => Ok(Self::Initial),
            _ => Err(InvalidMolecularConditionError::UnknownReference(s.to_string())),
        }
    }
}

/// Which amount of an entity a condition speaks about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MolecularQuantityReference {
    pub kind: ReferenceKind,
    pub entity: Entity,
}

impl MolecularQuantityReference {
    pub fn new(kind: ReferenceKind, entity: Entity) -> Self {
        Self { kind, entity }
    }

    pub fn initial(entity: Entity) -> Self {
        Self::new(ReferenceKind::Initial, entity)
    }

    pub fn total(entity: Entity) -> Self {
        Self::new(ReferenceKind::Total, entity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConditionKind {
    /// Set the amount to an exact molecule count.
    Exact(u64),
    /// Scale the amount by a non-negative factor.
    Multiple(f64),
    Increase,
    Decrease,
}

#[derive(Deserialize)]
struct RawCondition {
    kind: ConditionKind,
    quantity: MolecularQuantityReference,
}

impl TryFrom<RawCondition> for MolecularCondition {
    type Error = InvalidMolecularConditionError;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.quantity)
    }
}

/// A perturbation of the initial amount of one entity.
///
/// Deserialized conditions are validated like constructed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition")]
pub struct MolecularCondition {
    kind: ConditionKind,
    quantity: MolecularQuantityReference,
}

impl MolecularCondition {
    pub fn new(kind: ConditionKind, quantity: MolecularQuantityReference) -> Result<Self, InvalidMolecularConditionError> {
        if quantity.kind != ReferenceKind::Initial {
            return Err(InvalidMolecularConditionError::NotInitial(quantity.entity));
        }

        if let ConditionKind::Multiple(factor) = kind {
            if !factor.is_finite() || factor < 0.0 {
                return Err(InvalidMolecularConditionError::InvalidFactor(factor));
            }
        }

        Ok(Self { kind, quantity })
    }

    pub fn exact(quantity: MolecularQuantityReference, value: MolecularQuantity) -> Result<Self, InvalidMolecularConditionError> {
        match value {
            MolecularQuantity::Number(count) => Self::new(ConditionKind::Exact(count), quantity),
            _ => Err(InvalidMolecularConditionError::NonNumericExact(value)),
        }
    }

    pub fn multiple(quantity: MolecularQuantityReference, factor: f64) -> Result<Self, InvalidMolecularConditionError> {
        Self::new(ConditionKind::Multiple(factor), quantity)
    }

    pub fn increase(quantity: MolecularQuantityReference) -> Result<Self, InvalidMolecularConditionError> {
        Self::new(ConditionKind::Increase, quantity)
    }

    pub fn decrease(quantity: MolecularQuantityReference) -> Result<Self, InvalidMolecularConditionError> {
        Self::new(ConditionKind::Decrease, quantity)
    }

    /// Build a directional condition from its name, `increase` or `decrease`.
    pub fn directional(kind: &str, quantity: MolecularQuantityReference) -> Result<Self, InvalidMolecularConditionError> {
        match kind {
            "increase" => Self::increase(quantity),
            "decrease" => Self::decrease(quantity),
            _ => Err(InvalidMolecularConditionError::UnknownType(kind.to_string())),
        }
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn quantity(&self) -> &MolecularQuantityReference {
        &self.quantity
    }

    /// New initial amount obtained by applying the condition to `amount`.
    pub fn apply(&self, amount: f64, increase_factor: f64, decrease_factor: f64) -> f64 {
        match self.kind {
            ConditionKind::Exact(count) => count as f64,
            ConditionKind::Multiple(factor) => amount * factor,
            ConditionKind::Increase => amount * increase_factor,
            ConditionKind::Decrease => amount * decrease_factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{
        ConcentrationUnit, InvalidMolecularConditionError, InvalidMolecularQuantityError, MolecularCondition,
        MolecularQuantity, MolecularQuantityReference,
    };
    use crate::model::Entity;
    use crate::pattern::Level;

    fn erk() -> MolecularQuantityReference {
        MolecularQuantityReference::initial(Entity::new("ERK"))
    }

    #[test]
    fn parse_quantities() -> Result<(), InvalidMolecularQuantityError> {
        let concentration = MolecularQuantity::parse("10 nM", "concentration")?;

        assert_eq!(
            concentration,
            MolecularQuantity::Concentration {
                value: 10.0,
                unit: ConcentrationUnit::Nanomolar
            }
        );
        assert_relative_eq!(concentration.molar().unwrap_or_default(), 1e-8);
        assert_eq!(MolecularQuantity::parse("2.5uM", "concentration")?.to_string(), "2.5 uM");
        assert_eq!(
            MolecularQuantity::parse("1e-3 nM", "concentration")?,
            MolecularQuantity::Concentration {
                value: 1e-3,
                unit: ConcentrationUnit::Nanomolar
            }
        );
        assert_eq!(MolecularQuantity::parse("500", "number")?, MolecularQuantity::Number(500));
        assert_eq!(
            MolecularQuantity::parse("High", "qualitative")?,
            MolecularQuantity::Qualitative(Level::High)
        );

        Ok(())
    }

    #[test]
    fn invalid_quantities() {
        assert!(matches!(
            MolecularQuantity::parse("-3", "number"),
            Err(InvalidMolecularQuantityError::InvalidNumber(_))
        ));
        assert!(matches!(
            MolecularQuantity::parse("10 furlongs", "concentration"),
            Err(InvalidMolecularQuantityError::UnknownUnit(_))
        ));
        assert!(matches!(
            MolecularQuantity::parse("nM", "concentration"),
            Err(InvalidMolecularQuantityError::InvalidConcentration(_))
        ));
        assert!(matches!(
            MolecularQuantity::parse("medium", "qualitative"),
            Err(InvalidMolecularQuantityError::InvalidQualitative(_))
        ));
        assert!(matches!(
            MolecularQuantity::parse("1", "mass"),
            Err(InvalidMolecularQuantityError::UnknownType(_))
        ));
    }

    #[test]
    fn conditions() -> Result<(), InvalidMolecularConditionError> {
        let exact = MolecularCondition::exact(erk(), MolecularQuantity::Number(0))?;
        let double = MolecularCondition::multiple(erk(), 2.0)?;
        let lower = MolecularCondition::directional("decrease", erk())?;

        assert_relative_eq!(exact.apply(100.0, 2.0, 0.5), 0.0);
        assert_relative_eq!(double.apply(100.0, 2.0, 0.5), 200.0);
        assert_relative_eq!(lower.apply(100.0, 2.0, 0.5), 50.0);
        assert_relative_eq!(MolecularCondition::increase(erk())?.apply(100.0, 3.0, 0.5), 300.0);

        Ok(())
    }

    #[test]
    fn invalid_conditions() {
        assert!(matches!(
            MolecularCondition::exact(erk(), MolecularQuantity::Qualitative(Level::Low)),
            Err(InvalidMolecularConditionError::NonNumericExact(_))
        ));
        assert_eq!(
            MolecularCondition::multiple(erk(), -1.0),
            Err(InvalidMolecularConditionError::InvalidFactor(-1.0))
        );
        assert!(MolecularCondition::directional("toggle", erk()).is_err());
        assert!(matches!(
            MolecularCondition::increase(MolecularQuantityReference::total(Entity::new("ERK"))),
            Err(InvalidMolecularConditionError::NotInitial(_))
        ));
    }

    #[test]
    fn deserialized_conditions_are_validated() -> Result<(), serde_json::Error> {
        let doubled: MolecularCondition = serde_json::from_str(
            r#"{ "kind": { "Multiple": 2.0 }, "quantity": { "kind": "initial", "entity": { "name": "ERK" } } }"#,
        )?;
        assert_relative_eq!(doubled.apply(100.0, 2.0, 0.5), 200.0);

        let negative = serde_json::from_str::<MolecularCondition>(
            r#"{ "kind": { "Multiple": -3.0 }, "quantity": { "kind": "initial", "entity": { "name": "ERK" } } }"#,
        );
        let total = serde_json::from_str::<MolecularCondition>(
            r#"{ "kind": "Increase", "quantity": { "kind": "total", "entity": { "name": "ERK" } } }"#,
        );

        assert!(negative.is_err());
        assert!(total.is_err());

        Ok(())
    }
}
