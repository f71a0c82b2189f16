//! Proportional partitioning of identifier sets.
//!
//! Migration lays every categorical column out over the identifier space:
//! each interval of the working set is split into consecutive runs, one per
//! category, sized by the category's probability. Run boundaries are rounded
//! from the cumulative probability, so the runs of one interval always add up
//! to the interval exactly.

use crate::interval::IntervalError;
use crate::interval_set::IntervalSet;
use rndb_core::{Value, Weights};

/// The identifiers assigned to each category of one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPartition {
    categories: Vec<(Value, IntervalSet)>,
}

impl ColumnPartition {
    /// Create an empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers assigned to `value`.
    pub fn get(&self, value: &Value) -> Option<&IntervalSet> {
        self.categories
            .iter()
            .find(|(category, _)| category == value)
            .map(|(_, ids)| ids)
    }

    /// The category `id` was assigned to, if any.
    ///
    /// Scans categories in declaration order; columns are expected to have
    /// few categories.
    pub fn category_of(&self, id: u64) -> Option<&Value> {
        self.categories
            .iter()
            .find(|(_, ids)| ids.contains(id))
            .map(|(category, _)| category)
    }

    /// Categories and their identifiers, in first-assigned order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &IntervalSet)> {
        self.categories.iter().map(|(category, ids)| (category, ids))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no category has been assigned.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Total number of identifiers assigned to any category.
    pub fn count(&self) -> u64 {
        self.categories.iter().map(|(_, ids)| ids.count()).sum()
    }

    /// Every assigned identifier, keeping each category's interval boundaries.
    pub fn covered(&self) -> Result<IntervalSet, IntervalError> {
        self.categories
            .iter()
            .try_fold(IntervalSet::new(), |covered, (_, ids)| covered.disjoint_union(ids))
    }

    /// Add identifiers to a category, creating it if needed.
    ///
    /// Fails if any identifier is already assigned to that category.
    pub fn assign(&mut self, value: Value, ids: IntervalSet) -> Result<(), IntervalError> {
        match self.categories.iter_mut().find(|(category, _)| *category == value) {
            Some((_, existing)) => *existing = existing.disjoint_union(&ids)?,
            None => self.categories.push((value, ids)),
        }
        Ok(())
    }
}

/// Split every interval of `working` across the categories of `weights`.
///
/// Categories receive consecutive runs in declaration order. The last
/// category's upper bound is pinned to exactly 1, so floating-point error in
/// the running sum never leaves identifiers unassigned. Every declared
/// category is returned, possibly with an empty set.
pub fn subdivide(working: &IntervalSet, weights: &Weights) -> Vec<(Value, IntervalSet)> {
    let last = weights.len().saturating_sub(1);
    let mut cumulative = 0.0;
    weights
        .iter()
        .enumerate()
        .map(|(idx, (value, probability))| {
            let lo = cumulative;
            cumulative += probability;
            let hi = if idx == last { 1.0 } else { cumulative };
            (value.clone(), working.scale(lo, hi))
        })
        .collect()
}
