//! Parse temporal pattern strings into [`Formula`] trees.
//!
//! The grammar is deliberately small:
//!
//! | syntax        | meaning                                |
//! | ------------- | -------------------------------------- |
//! | `A \| B`      | disjunction                            |
//! | `A & B`       | conjunction                            |
//! | `!A`          | negation                               |
//! | `F A`         | eventually                             |
//! | `G A`         | always                                 |
//! | `[var,lb,ub]` | atomic predicate `lb <= var <= ub`     |
//! | `(A)`         | grouping                               |
//!
//! The lowest precedence operator is split first: the input is divided at the first `|` that is
//! not nested inside parentheses or brackets, then at the first such `&`, and only then are the
//! prefix operators considered. As a result `F[X,1,1] & FG[X,0,0]` is a conjunction of two
//! temporal formulas, and both connectives associate to the right.
//!
//! ```rust
//! use tra::parser::parse_formula;
//!
//! let formula = parse_formula("F[X,1,1] & FG[X,0,0]")?;
//! assert_eq!(formula.to_string(), "F[X,1,1] & FG[X,0,0]");
//! # Ok::<(), tra::parser::ParseError>(())
//! ```

use std::str::FromStr;

use nom::bytes::complete::take_while1;
use nom::character::complete::{char, space0};
use nom::combinator::all_consuming;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, terminated, tuple};
use nom::IResult;
use thiserror::Error;

use crate::formula::Formula;
use crate::predicate::{BoundsError, RangePredicate};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Empty formula")]
    Empty,

    #[error("Unbalanced '{delimiter}' in \"{input}\"")]
    Unbalanced { delimiter: char, input: String },

    #[error("Unexpected token in \"{0}\"")]
    UnexpectedToken(String),

    #[error("Invalid atomic predicate \"{0}\"")]
    InvalidAtom(String),

    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-')
}

fn var_name(input: &str) -> IResult<&str, &str> {
    take_while1(is_name_char)(input)
}

fn separator(input: &str) -> IResult<&str, char> {
    delimited(space0, char(','), space0)(input)
}

fn atom_parts(input: &str) -> IResult<&str, (&str, f64, f64)> {
    let body = tuple((
        preceded(space0, var_name),
        preceded(separator, double),
        terminated(preceded(separator, double), space0),
    ));

    all_consuming(delimited(char('['), body, char(']')))(input)
}

fn atom(input: &str) -> Result<Formula, ParseError> {
    let (_, (name, lower, upper)) = atom_parts(input).map_err(|_| ParseError::InvalidAtom(input.to_string()))?;
    let predicate = RangePredicate::new(name, lower, upper)?;

    Ok(Formula::Atomic(predicate))
}

fn depth_change(c: char) -> i32 {
    match c {
        '(' | '[' => 1,
        ')' | ']' => -1,
        _ => 0,
    }
}

fn check_balance(input: &str) -> Result<(), ParseError> {
    for (open, close) in [('(', ')'), ('[', ']')] {
        let mut depth = 0i32;

        for c in input.chars() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
            }

            if depth < 0 {
                break;
            }
        }

        if depth != 0 {
            return Err(ParseError::Unbalanced {
                delimiter: if depth < 0 { close } else { open },
                input: input.to_string(),
            });
        }
    }

    Ok(())
}

/// Byte offset of the first occurrence of `op` outside of any parentheses or brackets.
fn split_point(input: &str, op: char) -> Option<usize> {
    let mut depth = 0;

    for (index, c) in input.char_indices() {
        if c == op && depth == 0 {
            return Some(index);
        }

        depth += depth_change(c);
    }

    None
}

/// Byte offset of the parenthesis closing the one that opens `input`.
fn closing_paren(input: &str) -> Option<usize> {
    let mut depth = 0;

    for (index, c) in input.char_indices() {
        depth += depth_change(c);

        if depth == 0 {
            return Some(index);
        }
    }

    None
}

fn binary<F>(input: &str, index: usize, ctor: F) -> Result<Formula, ParseError>
where
    F: Fn(Formula, Formula) -> Formula,
{
    let left = formula(&input[..index])?;
    let right = formula(&input[index + 1..])?;

    Ok(ctor(left, right))
}

fn formula(input: &str) -> Result<Formula, ParseError> {
    let input = input.trim();
    let first = input.chars().next().ok_or(ParseError::Empty)?;

    if let Some(index) = split_point(input, '|') {
        return binary(input, index, Formula::or);
    }

    if let Some(index) = split_point(input, '&') {
        return binary(input, index, Formula::and);
    }

    let rest = &input[first.len_utf8()..];

    match first {
        '!' => formula(rest).map(Formula::not),
        'F' => formula(rest).map(Formula::eventually),
        'G' => formula(rest).map(Formula::always),
        '[' => atom(input),
        '(' => match closing_paren(input) {
            Some(end) if end == input.len() - 1 => formula(&input[1..end]),
            _ => Err(ParseError::UnexpectedToken(input.to_string())),
        },
        _ => Err(ParseError::UnexpectedToken(input.to_string())),
    }
}

/// Build the formula tree for a temporal pattern string.
///
/// Malformed input never produces a partial tree; every failure is reported as a [`ParseError`].
pub fn parse_formula(input: &str) -> Result<Formula, ParseError> {
    check_balance(input)?;
    formula(input)
}

impl FromStr for Formula {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s)
    }
}
