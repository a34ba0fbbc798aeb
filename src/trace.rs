//! Time-ordered samples produced by a simulation run.
//!
//! A [`Trace`] is an associative map from sample time to state. Simulators emit a
//! `Trace<HashMap<String, f64>>` mapping observable names to values, the property checker
//! discretizes it into boolean levels, and the model checker consumes it one sample at a time in
//! chronological order.
//!
//! # Panics
//!
//! Times are stored as [`NotNan<f64>`] so that they can be ordered. Inserting or looking up a NaN
//! time panics.
//!
//! # Examples
//!
//! ```rust
//! use tra::Trace;
//!
//! let mut trace = Trace::from([(0.0, 1.0), (1.0, 3.0)]);
//! trace.insert(2.0, 5.0);
//!
//! assert_eq!(trace.len(), 3);
//! assert_eq!(trace.at_time(1.0), Some(&3.0));
//! assert_eq!(trace.last_time(), Some(2.0));
//! ```

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Index;

use ordered_float::NotNan;

/// A set of states where each state is associated with a time.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Trace<T>(BTreeMap<NotNan<f64>, T>);

impl<T> Default for Trace<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn key(time: f64) -> NotNan<f64> {
    NotNan::new(time).expect("trace times must not be NaN")
}

impl<A, T> FromIterator<(A, T)> for Trace<T>
where
    A: Into<f64>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (A, T)>,
    {
        let elements = iter
            .into_iter()
            .map(|(time, state)| (key(time.into()), state))
            .collect();

        Self(elements)
    }
}

impl<A, T, const N: usize> From<[(A, T); N]> for Trace<T>
where
    A: Into<f64>,
{
    #[inline]
    fn from(values: [(A, T); N]) -> Self {
        Self::from_iter(values)
    }
}

impl<A, T> From<Vec<(A, T)>> for Trace<T>
where
    A: Into<f64>,
{
    #[inline]
    fn from(values: Vec<(A, T)>) -> Self {
        Self::from_iter(values)
    }
}

impl<T> Index<f64> for Trace<T> {
    type Output = T;

    fn index(&self, index: f64) -> &Self::Output {
        self.0.index(&key(index))
    }
}

impl<T> Trace<T> {
    /// Create a new empty trace. Equivalent to [`Trace::default()`]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Number of samples in the trace
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Determine if the trace contains any samples
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the state for a given time. Returns None if the time is not present in the trace.
    pub fn at_time(&self, time: f64) -> Option<&T> {
        self.0.get(&key(time))
    }

    /// Insert a state for a given time into the trace. Returns the prior state if it exists.
    pub fn insert(&mut self, time: f64, state: T) -> Option<T> {
        self.0.insert(key(time), state)
    }

    /// Time of the final sample, if any.
    pub fn last_time(&self) -> Option<f64> {
        self.0.keys().next_back().map(|time| time.into_inner())
    }

    /// Iterate over the (time, state) pairs in chronological order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter(self.0.iter())
    }

    /// Iterate over the sample times in chronological order.
    pub fn times(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + '_ {
        self.0.keys().map(|time| time.into_inner())
    }

    /// Iterate over the states in chronological order.
    pub fn states(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.0.values()
    }

    /// Apply `f` to every state while keeping the times the same.
    ///
    /// ```rust
    /// use tra::Trace;
    ///
    /// let trace = Trace::from([(0.0, 20.0), (1.0, 80.0)]);
    /// let levels: Trace<bool> = trace.map_states(|value| *value > 50.0);
    ///
    /// assert_eq!(levels[1.0], true);
    /// ```
    pub fn map_states<F, U>(&self, mut f: F) -> Trace<U>
    where
        F: FnMut(&T) -> U,
    {
        Trace(self.0.iter().map(|(time, state)| (*time, f(state))).collect())
    }

    /// Keep every `stride`-th sample starting with the first one. A stride of zero or one keeps
    /// every sample.
    ///
    /// ```rust
    /// use tra::Trace;
    ///
    /// let trace: Trace<usize> = (0..10).map(|i| (i as f64, i)).collect();
    /// let sparse = trace.downsample(5);
    ///
    /// assert_eq!(sparse.times().collect::<Vec<_>>(), vec![0.0, 5.0]);
    /// ```
    pub fn downsample(&self, stride: usize) -> Trace<T>
    where
        T: Clone,
    {
        let stride = stride.max(1);
        let elements = self
            .0
            .iter()
            .step_by(stride)
            .map(|(time, state)| (*time, state.clone()))
            .collect();

        Trace(elements)
    }

    /// Drop every sample taken before `time`.
    pub fn starting_at(&self, time: f64) -> Trace<T>
    where
        T: Clone,
    {
        let elements = self
            .0
            .iter()
            .filter(|(sample, _)| sample.into_inner() >= time)
            .map(|(sample, state)| (*sample, state.clone()))
            .collect();

        Trace(elements)
    }
}

/// Borrowing iterator over the (time, state) pairs in a trace.
pub struct Iter<'a, T>(btree_map::Iter<'a, NotNan<f64>, T>);

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (f64, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(time, state)| (time.into_inner(), state))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back().map(|(time, state)| (time.into_inner(), state))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'a, T> IntoIterator for &'a Trace<T> {
    type Item = (f64, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over the (time, state) pairs in a trace.
pub struct IntoIter<T>(btree_map::IntoIter<NotNan<f64>, T>);

impl<T> Iterator for IntoIter<T> {
    type Item = (f64, T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(time, state)| (time.into_inner(), state))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl<T> IntoIterator for Trace<T> {
    type Item = (f64, T);
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.0.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::Trace;

    fn ramp() -> Trace<f64> {
        (0..12).map(|i| (i as f64 * 0.5, i as f64)).collect()
    }

    #[test]
    fn chronological_iteration() {
        let trace = Trace::from([(2.0, 'c'), (0.0, 'a'), (1.0, 'b')]);
        let states: Vec<char> = trace.states().copied().collect();

        assert_eq!(states, vec!['a', 'b', 'c']);
        assert_eq!(trace.last_time(), Some(2.0));
    }

    #[test]
    fn insert_replaces_existing_time() {
        let mut trace = Trace::from([(0.0, 1.0)]);

        assert_eq!(trace.insert(0.0, 2.0), Some(1.0));
        assert_eq!(trace[0.0], 2.0);
        assert_eq!(trace.len(), 1);
    }

    #[test]
    fn downsample_keeps_first_sample() {
        let sparse = ramp().downsample(5);
        let times: Vec<f64> = sparse.times().collect();

        assert_eq!(times, vec![0.0, 2.5, 5.0]);
        assert_eq!(ramp().downsample(0), ramp());
    }

    #[test]
    fn starting_at_drops_earlier_samples() {
        let late = ramp().starting_at(4.5);

        assert_eq!(late.times().collect::<Vec<_>>(), vec![4.5, 5.0, 5.5]);
        assert!(ramp().starting_at(10.0).is_empty());
    }

    #[test]
    fn map_states_preserves_times() {
        let trace = ramp();
        let levels = trace.map_states(|value| *value > 5.0);

        assert_eq!(levels.times().collect::<Vec<_>>(), trace.times().collect::<Vec<_>>());
        assert_eq!(levels.at_time(3.0), Some(&true));
        assert_eq!(levels.at_time(2.5), Some(&false));
    }

    #[test]
    fn empty_trace() {
        let trace: Trace<()> = Trace::new();

        assert!(trace.is_empty());
        assert_eq!(trace.last_time(), None);
    }
}
