//! Explicit simulatable models and the seams used to build and query them.
//!
//! A [`Model`] is an owned value passed by reference to every collaborator; there is no ambient
//! model registry. The property checker clones the caller's model once per check and applies all
//! perturbations and observable definitions to the clone.
//!
//! ```rust
//! use tra::model::{Model, Monomer, SitePattern};
//!
//! let mut model = Model::new("mapk");
//! model.add_monomer(Monomer::new("ERK").with_site("T185", ["u", "p"]));
//! model.set_parameter("ERK_0", 100.0);
//!
//! let pattern = SitePattern::from([("T185", "p")]);
//! let name = model.get_or_create_observable("ERK", &pattern)?;
//!
//! assert_eq!(name, "ERK_T185_p_obs");
//! assert_eq!(model.get_or_create_observable("ERK", &pattern)?, name);
//! # Ok::<(), tra::model::ModelError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Model has no monomer \"{0}\"")]
    MissingMonomer(String),

    #[error("Monomer \"{monomer}\" has no site \"{site}\"")]
    MissingMonomerSite { monomer: String, site: String },

    #[error("Model has no parameter \"{0}\"")]
    MissingParameter(String),
}

/// Description of a molecular entity as it appears in a request, e.g. ERK phosphorylated on
/// T185.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub sites: Vec<(String, String)>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sites: Vec::new(),
        }
    }

    pub fn with_site(mut self, site: impl Into<String>, state: impl Into<String>) -> Self {
        self.sites.push((site.into(), state.into()));
        self
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;

        for (site, state) in &self.sites {
            write!(f, " {}={}", site, state)?;
        }

        Ok(())
    }
}

/// Required states of a subset of a monomer's sites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SitePattern(BTreeMap<String, String>);

impl SitePattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, site: impl Into<String>, state: impl Into<String>) {
        self.0.insert(site.into(), state.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(site, state)| (site.as_str(), state.as_str()))
    }
}

impl<S, T, const N: usize> From<[(S, T); N]> for SitePattern
where
    S: Into<String>,
    T: Into<String>,
{
    fn from(values: [(S, T); N]) -> Self {
        Self(values.into_iter().map(|(site, state)| (site.into(), state.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monomer {
    pub name: String,
    /// Site name to the states the site can take.
    #[serde(default)]
    pub sites: BTreeMap<String, Vec<String>>,
}

impl Monomer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sites: BTreeMap::new(),
        }
    }

    pub fn with_site<I, S>(mut self, site: impl Into<String>, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sites.insert(site.into(), states.into_iter().map(Into::into).collect());
        self
    }

    /// Name of the parameter holding the initial amount of this monomer.
    pub fn initial_parameter(&self) -> String {
        format!("{}_0", self.name)
    }
}

/// A named quantity tracked by the simulator: the amount of a monomer matching a site pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observable {
    pub name: String,
    pub monomer: String,
    pub pattern: SitePattern,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub monomers: BTreeMap<String, Monomer>,
    pub parameters: BTreeMap<String, f64>,
    pub observables: BTreeMap<String, Observable>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_monomer(&mut self, monomer: Monomer) {
        self.monomers.insert(monomer.name.clone(), monomer);
    }

    pub fn monomer(&self, name: &str) -> Result<&Monomer, ModelError> {
        self.monomers
            .get(name)
            .ok_or_else(|| ModelError::MissingMonomer(name.to_string()))
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: f64) {
        self.parameters.insert(name.into(), value);
    }

    pub fn parameter(&self, name: &str) -> Result<f64, ModelError> {
        self.parameters
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::MissingParameter(name.to_string()))
    }

    pub fn parameter_mut(&mut self, name: &str) -> Result<&mut f64, ModelError> {
        self.parameters
            .get_mut(name)
            .ok_or_else(|| ModelError::MissingParameter(name.to_string()))
    }

    /// Check that a monomer exists and carries every site named in a pattern.
    pub fn validate_pattern(&self, monomer: &str, pattern: &SitePattern) -> Result<(), ModelError> {
        let found = self.monomer(monomer)?;

        for (site, _) in pattern.iter() {
            if !found.sites.contains_key(site) {
                return Err(ModelError::MissingMonomerSite {
                    monomer: monomer.to_string(),
                    site: site.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Return the name of the observable for a monomer pattern, creating it if needed.
    ///
    /// Calling this repeatedly with the same arguments returns the same name and leaves the model
    /// unchanged after the first call.
    pub fn get_or_create_observable(&mut self, monomer: &str, pattern: &SitePattern) -> Result<String, ModelError> {
        self.validate_pattern(monomer, pattern)?;

        let mut name = monomer.to_string();
        for (site, state) in pattern.iter() {
            name.push('_');
            name.push_str(site);
            name.push('_');
            name.push_str(state);
        }
        name.push_str("_obs");

        self.observables.entry(name.clone()).or_insert_with(|| Observable {
            name: name.clone(),
            monomer: monomer.to_string(),
            pattern: pattern.clone(),
        });

        Ok(name)
    }
}

/// Maps request-level entity descriptions onto monomers of an assembled model.
pub trait EntityResolver {
    fn resolve(&self, entity: &Entity) -> (String, SitePattern);
}

impl<T> EntityResolver for &T
where
    T: EntityResolver + ?Sized,
{
    fn resolve(&self, entity: &Entity) -> (String, SitePattern) {
        (**self).resolve(entity)
    }
}

/// Resolver that turns an entity name into a valid monomer identifier and copies its sites.
///
/// Characters other than ASCII letters, digits and `_` become `_`, and a leading digit is
/// prefixed with `p`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

pub fn monomer_name(name: &str) -> String {
    let mut normalized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if normalized.starts_with(|c: char| c.is_ascii_digit()) {
        normalized.insert(0, 'p');
    }

    normalized
}

impl EntityResolver for NameResolver {
    fn resolve(&self, entity: &Entity) -> (String, SitePattern) {
        let mut pattern = SitePattern::new();

        for (site, state) in &entity.sites {
            pattern.insert(site.clone(), state.clone());
        }

        (monomer_name(&entity.name), pattern)
    }
}

/// Turns domain statements into a simulatable [`Model`].
pub trait ModelAssembler {
    type Statement;
    type Error: std::error::Error + Send + Sync + 'static;

    fn assemble(&self, statements: &[Self::Statement]) -> Result<Model, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::{monomer_name, Entity, EntityResolver, Model, ModelError, Monomer, NameResolver, SitePattern};

    fn model() -> Model {
        let mut model = Model::new("test");
        model.add_monomer(Monomer::new("MEK").with_site("S218", ["u", "p"]));
        model.set_parameter("MEK_0", 50.0);
        model
    }

    #[test]
    fn observable_is_created_once() -> Result<(), ModelError> {
        let mut model = model();
        let pattern = SitePattern::from([("S218", "p")]);

        let first = model.get_or_create_observable("MEK", &pattern)?;
        let second = model.get_or_create_observable("MEK", &pattern)?;
        let total = model.get_or_create_observable("MEK", &SitePattern::new())?;

        assert_eq!(first, second);
        assert_eq!(total, "MEK_obs");
        assert_eq!(model.observables.len(), 2);

        Ok(())
    }

    #[test]
    fn missing_entities() {
        let mut model = model();

        assert_eq!(
            model.get_or_create_observable("RAF", &SitePattern::new()),
            Err(ModelError::MissingMonomer("RAF".to_string()))
        );
        assert_eq!(
            model.get_or_create_observable("MEK", &SitePattern::from([("S222", "p")])),
            Err(ModelError::MissingMonomerSite {
                monomer: "MEK".to_string(),
                site: "S222".to_string()
            })
        );
        assert!(model.observables.is_empty());
        assert_eq!(model.parameter("RAF_0"), Err(ModelError::MissingParameter("RAF_0".to_string())));
    }

    #[test]
    fn name_resolution() {
        let entity = Entity::new("MAP2K1-p").with_site("S218", "p");
        let (monomer, pattern) = NameResolver.resolve(&entity);

        assert_eq!(monomer, "MAP2K1_p");
        assert_eq!(pattern, SitePattern::from([("S218", "p")]));
        assert_eq!(monomer_name("14-3-3"), "p14_3_3");
    }
}
