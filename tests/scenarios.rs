use std::collections::HashMap;
use std::error::Error;

use tra::checker::{ModelChecker, Status};
use tra::model::Entity;
use tra::pattern::{Level, PatternKind, PatternValue, TemporalPattern};
use tra::{check_formula, check_trace, Trace};

fn trace(values: &[f64]) -> Trace<HashMap<String, f64>> {
    values
        .iter()
        .enumerate()
        .map(|(time, value)| (time as f64, HashMap::from([("X".to_string(), *value)])))
        .collect()
}

#[test]
fn transient() -> Result<(), Box<dyn Error>> {
    assert!(check_formula("F[X,1,1] & FG[X,0,0]", &trace(&[0.0, 1.0, 1.0, 0.0, 0.0, 0.0]))?);
    assert!(!check_formula("F[X,1,1] & FG[X,0,0]", &trace(&[0.0, 1.0, 1.0, 0.0, 0.0, 1.0]))?);
    assert!(!check_formula("F[X,1,1] & FG[X,0,0]", &trace(&[0.0, 0.0, 0.0]))?);

    Ok(())
}

#[test]
fn anchored_atom_reads_the_first_sample() -> Result<(), Box<dyn Error>> {
    assert!(!check_formula("[X,1,1] & FG[X,0,0]", &trace(&[0.0, 1.0, 1.0, 0.0, 0.0, 0.0]))?);
    assert!(check_formula("[X,1,1] & FG[X,0,0]", &trace(&[1.0, 1.0, 0.0, 0.0]))?);

    Ok(())
}

#[test]
fn no_change_fails_at_first_change() -> Result<(), Box<dyn Error>> {
    let mut checker: ModelChecker = "G[X,0,0]".parse()?;
    let samples = trace(&[0.0, 0.0, 0.0, 1.0, 0.0]);
    let mut decided_at = None;

    for (index, (time, state)) in samples.iter().enumerate() {
        if checker.update(state, index + 1 == samples.len())?.is_decided() && decided_at.is_none() {
            decided_at = Some(time);
        }
    }

    assert_eq!(checker.status(), Status::Decided(false));
    assert_eq!(decided_at, Some(3.0));

    Ok(())
}

#[test]
fn sustained() -> Result<(), Box<dyn Error>> {
    let mut checker: ModelChecker = "FG[X,1,1]".parse()?;
    let samples = trace(&[0.0, 1.0, 1.0, 1.0, 1.0]);
    let mut statuses = Vec::new();

    for (index, (_, state)) in samples.iter().enumerate() {
        statuses.push(checker.update(state, index + 1 == samples.len())?);
    }

    assert_eq!(statuses[..4], [Status::Evaluating; 4]);
    assert_eq!(statuses[4], Status::Decided(true));

    Ok(())
}

#[test]
fn value_patterns_compare_exactly() -> Result<(), Box<dyn Error>> {
    let high = Some(PatternValue::Qualitative(Level::High));
    let cases = [
        (PatternKind::AlwaysValue, [1.0, 1.0, 1.0], true),
        (PatternKind::AlwaysValue, [1.0, 0.0, 1.0], false),
        (PatternKind::EventualValue, [0.0, 1.0, 1.0], true),
        (PatternKind::EventualValue, [1.0, 1.0, 0.0], false),
        (PatternKind::SometimeValue, [0.0, 1.0, 0.0], true),
        (PatternKind::SometimeValue, [0.0, 0.0, 0.0], false),
    ];

    for (kind, values, expected) in cases {
        let pattern = TemporalPattern::new(kind, vec![Entity::new("ERK")], high, None)?;
        let compiled = pattern.compile("ERK_obs", 0.5, 0.1)?;

        for predicate in compiled.formula().predicates() {
            assert_eq!(predicate.lower(), predicate.upper());
        }

        assert_eq!(check_trace(compiled.formula(), &trace(&values))?, expected, "{} over {:?}", kind, values);
    }

    Ok(())
}

#[test]
fn discretized_simulation_output() -> Result<(), Box<dyn Error>> {
    let pattern = TemporalPattern::new(PatternKind::Transient, vec![Entity::new("ERK")], None, None)?;
    let compiled = pattern.compile("ERK_obs", 50.0, 0.1)?;
    let raw: Trace<HashMap<String, f64>> = [5.0, 60.0, 75.0, 40.0, 12.0, 3.0]
        .into_iter()
        .enumerate()
        .map(|(time, value)| (time as f64 * 10.0, HashMap::from([("ERK_obs".to_string(), value)])))
        .collect();

    let discrete = compiled.discretize(&raw)?;

    assert_eq!(discrete.states().map(|state| state["X"]).collect::<Vec<_>>(), vec![0.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
    assert!(check_trace(compiled.formula(), &discrete)?);

    Ok(())
}
