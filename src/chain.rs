//! Lazy three-valued evaluation of a formula along a growing chain of time steps.
//!
//! A [`FormulaChain`] holds the static shape of a formula once, flattened into a table in which
//! every operand precedes the node using it, and one [`Link`] per time step. A link is a row of
//! truth slots, one for each node of the shape, describing the formula as seen from that time.
//! Links are joined implicitly by position: the link at position `p + 1` is the "next" of the link
//! at `p`, which lets the forward operators defer to the rest of the future:
//!
//! ```text
//! F φ @ p  =  φ @ p  |  F φ @ p+1        G φ @ p  =  φ @ p  &  G φ @ p+1
//! ```
//!
//! On the final link, or on a link reached by the optional position limit, the deferred part is
//! dropped and the operator takes the truth of its operand.
//!
//! Extending the chain allocates a fresh row of [`Truth::Unknown`] slots for the same shape,
//! standing in for a duplicated and linked copy of the whole formula tree.

use crate::formula::Formula;
use crate::predicate::{EvaluationError, RangePredicate, VariableSet};
use crate::truth::Truth;

/// A node of the flattened formula. Operands are referenced by their index in the shape table.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Atomic(RangePredicate),
    Not(usize),
    And(usize, usize),
    Or(usize, usize),
    Eventually(usize),
    Always(usize),
}

fn flatten(formula: &Formula, shapes: &mut Vec<Shape>) -> usize {
    let shape = match formula {
        Formula::Atomic(predicate) => Shape::Atomic(predicate.clone()),
        Formula::Not(sub) => Shape::Not(flatten(sub, shapes)),
        Formula::Eventually(sub) => Shape::Eventually(flatten(sub, shapes)),
        Formula::Always(sub) => Shape::Always(flatten(sub, shapes)),
        Formula::And(left, right) => {
            let left = flatten(left, shapes);
            Shape::And(left, flatten(right, shapes))
        }
        Formula::Or(left, right) => {
            let left = flatten(left, shapes);
            Shape::Or(left, flatten(right, shapes))
        }
    };

    shapes.push(shape);
    shapes.len() - 1
}

/// Truth slots of every formula node at one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    truths: Vec<Truth>,
    sampled: bool,
    last: bool,
}

impl Link {
    fn fresh(size: usize) -> Self {
        Self {
            truths: vec![Truth::Unknown; size],
            sampled: false,
            last: false,
        }
    }

    /// Returns `true` once a sample has been pushed into this link.
    pub fn is_sampled(&self) -> bool {
        self.sampled
    }

    /// Returns `true` if nothing follows this link.
    pub fn is_last(&self) -> bool {
        self.last
    }

    /// Fill in every slot that can be decided, returning `true` if any slot changed.
    fn evaluate(&mut self, shapes: &[Shape], next: Option<&Link>) -> bool {
        let mut changed = false;

        for (index, shape) in shapes.iter().enumerate() {
            if self.truths[index].is_known() {
                continue;
            }

            let deferred = || next.map_or(Truth::Unknown, |link| link.truths[index]);

            self.truths[index] = match shape {
                Shape::Atomic(_) => continue,
                Shape::Not(sub) => !self.truths[*sub],
                Shape::And(left, right) => self.truths[*left] & self.truths[*right],
                Shape::Or(left, right) => self.truths[*left] | self.truths[*right],
                Shape::Eventually(sub) if self.last => self.truths[*sub],
                Shape::Eventually(sub) => self.truths[*sub] | deferred(),
                Shape::Always(sub) if self.last => self.truths[*sub],
                Shape::Always(sub) => self.truths[*sub] & deferred(),
            };

            changed |= self.truths[index].is_known();
        }

        changed
    }
}

/// A formula unrolled over the time steps seen so far.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaChain {
    shapes: Vec<Shape>,
    links: Vec<Link>,
    limit: Option<usize>,
}

impl FormulaChain {
    /// Create a chain holding a single link at position 0.
    pub fn new(formula: &Formula) -> Self {
        let mut shapes = Vec::with_capacity(formula.size());
        flatten(formula, &mut shapes);

        let links = vec![Link::fresh(shapes.len())];

        Self {
            shapes,
            links,
            limit: None,
        }
    }

    /// Treat the link at position `limit - 1` as the final one, whatever the sample stream says.
    /// A limit of zero is treated as one.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.max(1));
        self
    }

    /// Number of links in the chain.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// A chain always holds at least one link.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Position of the link that receives the next sample.
    pub fn head(&self) -> usize {
        self.links.len() - 1
    }

    pub fn link(&self, position: usize) -> Option<&Link> {
        self.links.get(position)
    }

    /// Returns `true` if the head link has been marked as the final time step.
    pub fn is_closed(&self) -> bool {
        self.links[self.head()].last
    }

    fn root(&self) -> usize {
        self.shapes.len() - 1
    }

    /// Push one sample into the head link, setting the truth of every atomic node.
    ///
    /// The link becomes final if `is_last` is set or if the position limit has been reached. A
    /// sample pushed into a link that was already sampled is ignored.
    pub fn update<State>(&mut self, state: &State, is_last: bool) -> Result<(), EvaluationError>
    where
        State: VariableSet + ?Sized,
    {
        let head = self.head();
        let at_limit = self.limit.is_some_and(|limit| head + 1 >= limit);
        let link = &mut self.links[head];

        if link.sampled {
            return Ok(());
        }

        for (index, shape) in self.shapes.iter().enumerate() {
            if let Shape::Atomic(predicate) = shape {
                link.truths[index] = Truth::from(predicate.evaluate_state(state)?);
            }
        }

        link.sampled = true;
        link.last = is_last || at_limit;

        Ok(())
    }

    /// Append a fresh link after the head. Does nothing if the head is final.
    pub fn extend(&mut self) {
        if !self.is_closed() {
            self.links.push(Link::fresh(self.shapes.len()));
        }
    }

    /// Close the chain at the last sampled link, discarding an unsampled head.
    pub fn close(&mut self) {
        if self.links.len() > 1 && !self.links[self.head()].sampled {
            self.links.pop();
        }

        let head = self.head();
        self.links[head].last = self.links[head].sampled;
    }

    /// Evaluate the root formula at position 0.
    ///
    /// Links are swept from the head back to the start so that every forward operator sees the
    /// freshest value of its successor. Slots that are already decided are never recomputed.
    pub fn eval(&mut self) -> Truth {
        self.sweep();
        self.links[0].truths[self.root()]
    }

    /// Re-evaluate links from the head backwards, returning the number of links visited.
    ///
    /// A link only reads the forward operator slots of its successor, so the sweep stops at the
    /// first link in which no slot changed: every earlier link has already seen its successor's
    /// current values.
    fn sweep(&mut self) -> usize {
        let mut visited = 0;

        for position in (0..self.links.len()).rev() {
            let (current, later) = self.links.split_at_mut(position + 1);
            visited += 1;

            if !current[position].evaluate(&self.shapes, later.first()) {
                break;
            }
        }

        visited
    }

    /// Truth of the root formula at `position` as of the last evaluation.
    pub fn truth_at(&self, position: usize) -> Option<Truth> {
        self.links.get(position).map(|link| link.truths[self.root()])
    }
}
