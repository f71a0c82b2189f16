//! Disjoint interval sets.
//!
//! An [`IntervalSet`] represents an arbitrary subset of the identifier space
//! as a sorted list of disjoint [`Interval`]s. Partitions, query results and
//! samples are all interval sets, so a query over millions of records never
//! materializes its identifiers.
//!
//! Adjacent intervals are only merged by [`IntervalSet::union`]; every other
//! operation keeps the interval boundaries of its inputs. Migration relies on
//! this to subdivide each partition interval on its own.
//!
//! Equality is membership equality: two sets are equal when they contain the
//! same identifiers, however those are split into intervals.

use crate::interval::{Interval, IntervalError};
use rand::Rng;
use std::collections::BTreeSet;
use std::fmt;

/// Sorted collection of disjoint intervals.
#[derive(Debug, Clone, Default)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding `[min, max]`.
    pub fn from_range(min: u64, max: u64) -> Result<Self, IntervalError> {
        Ok(Self::from_interval(Interval::new(min, max)?))
    }

    /// Create a set holding one interval.
    pub fn from_interval(interval: Interval) -> Self {
        Self {
            intervals: vec![interval],
        }
    }

    /// The identifier space `[0, size)` of a table.
    pub fn full(size: u64) -> Self {
        match size {
            0 => Self::new(),
            size => Self::from_interval(span(0, size - 1)),
        }
    }

    /// Create a set of single-identifier intervals. Duplicates are ignored.
    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        let ids: BTreeSet<u64> = ids.into_iter().collect();
        Self {
            intervals: ids.into_iter().map(Interval::single).collect(),
        }
    }

    /// Add an interval, keeping the set sorted.
    ///
    /// Fails if the interval overlaps a member; touching intervals are kept
    /// separate.
    pub fn insert(&mut self, interval: Interval) -> Result<(), IntervalError> {
        let position = self
            .intervals
            .partition_point(|existing| existing.start() < interval.start());

        let neighbours = [position.checked_sub(1), Some(position)];
        for existing in neighbours
            .into_iter()
            .flatten()
            .filter_map(|idx| self.intervals.get(idx))
        {
            if existing.overlaps(&interval) {
                return Err(IntervalError::Overlap {
                    new: interval,
                    existing: *existing,
                });
            }
        }

        self.intervals.insert(position, interval);
        Ok(())
    }

    /// Member intervals in ascending order.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Number of identifiers in the set.
    pub fn count(&self) -> u64 {
        self.intervals.iter().map(Interval::count).sum()
    }

    /// Whether the set holds no identifiers.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: u64) -> bool {
        let position = self.intervals.partition_point(|interval| interval.end() < id);
        self.intervals
            .get(position)
            .is_some_and(|interval| interval.contains(id))
    }

    /// Smallest member.
    pub fn first(&self) -> Option<u64> {
        self.intervals.first().map(Interval::start)
    }

    /// Largest member.
    pub fn last(&self) -> Option<u64> {
        self.intervals.last().map(Interval::end)
    }

    /// Members of either set, with overlapping and adjacent intervals merged.
    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        let mut merged: Vec<Interval> =
            Vec::with_capacity(self.intervals.len() + other.intervals.len());
        for interval in merge_sorted(&self.intervals, &other.intervals) {
            match merged.last().and_then(|last| last.union(&interval)) {
                Some(combined) => {
                    let last = merged.len() - 1;
                    merged[last] = combined;
                }
                None => merged.push(interval),
            }
        }
        Self { intervals: merged }
    }

    /// Members of either set, keeping every interval boundary.
    ///
    /// Fails if the sets share an identifier.
    pub fn disjoint_union(&self, other: &IntervalSet) -> Result<IntervalSet, IntervalError> {
        let intervals: Vec<Interval> = merge_sorted(&self.intervals, &other.intervals).collect();
        if let Some(pair) = intervals.windows(2).find(|pair| pair[0].overlaps(&pair[1])) {
            return Err(IntervalError::Overlap {
                new: pair[1],
                existing: pair[0],
            });
        }
        Ok(Self { intervals })
    }

    /// Members of both sets.
    ///
    /// Every non-empty overlap of a pair of member intervals becomes one
    /// interval of the result.
    pub fn intersect(&self, other: &IntervalSet) -> IntervalSet {
        let mut intervals = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.intervals.len() && j < other.intervals.len() {
            let (left, right) = (&self.intervals[i], &other.intervals[j]);
            if let Some(overlap) = left.intersect(right) {
                intervals.push(overlap);
            }
            if left.end() < right.end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self { intervals }
    }

    /// Members of this set that are not in `other`.
    pub fn difference(&self, other: &IntervalSet) -> IntervalSet {
        let mut intervals = Vec::new();
        let mut j = 0;
        for interval in &self.intervals {
            let mut start = interval.start();
            let mut exhausted = false;
            while j < other.intervals.len() && other.intervals[j].end() < start {
                j += 1;
            }
            let mut k = j;
            while let Some(cut) = other.intervals.get(k) {
                if cut.start() > interval.end() {
                    break;
                }
                if cut.start() > start {
                    intervals.push(span(start, cut.start() - 1));
                }
                if cut.end() >= interval.end() {
                    exhausted = true;
                    break;
                }
                start = cut.end() + 1;
                k += 1;
            }
            if !exhausted {
                intervals.push(span(start, interval.end()));
            }
        }
        Self { intervals }
    }

    /// Sub-intervals covering the fractional span `[lo, hi)` of each member
    /// interval.
    ///
    /// Boundaries are rounded from the cumulative fraction, so scaling one
    /// set by contiguous spans that cover `[0, 1)` partitions every member
    /// interval exactly: no identifier is lost or assigned twice. Empty
    /// sub-intervals are dropped.
    pub fn scale(&self, lo: f64, hi: f64) -> IntervalSet {
        let intervals = self
            .intervals
            .iter()
            .filter_map(|interval| {
                let count = interval.count();
                let start = interval.start() + fraction_offset(count, lo);
                let end = interval.start() + fraction_offset(count, hi);
                (end > start).then(|| span(start, end - 1))
            })
            .collect();
        Self { intervals }
    }

    /// Identifier at a position in ascending order.
    ///
    /// Negative positions count from the end, so `-1` is the last member.
    /// Returns `None` outside `[-count, count)`.
    pub fn at(&self, index: i64) -> Option<u64> {
        let index = if index < 0 {
            self.count().checked_sub(index.unsigned_abs())?
        } else {
            index as u64
        };
        self.nth(index)
    }

    /// Identifier at a non-negative position.
    pub fn nth(&self, mut index: u64) -> Option<u64> {
        for interval in &self.intervals {
            if index < interval.count() {
                return Some(interval.start() + index);
            }
            index -= interval.count();
        }
        None
    }

    /// Position of `id` in ascending order, if it is a member.
    pub fn index_of(&self, id: u64) -> Option<u64> {
        let mut start = 0;
        for interval in &self.intervals {
            if interval.contains(id) {
                return Some(start + id - interval.start());
            }
            if interval.start() > id {
                return None;
            }
            start += interval.count();
        }
        None
    }

    /// Draw `min(limit, count)` distinct members uniformly at random.
    ///
    /// Positions are drawn with replacement and duplicates discarded, which
    /// is cheap while `limit` is small relative to the set.
    pub fn sample<R: Rng + ?Sized>(&self, limit: u64, rng: &mut R) -> IntervalSet {
        let count = self.count();
        let limit = limit.min(count);
        let mut chosen = BTreeSet::new();
        while (chosen.len() as u64) < limit {
            if let Some(id) = self.nth(rng.gen_range(0..count)) {
                chosen.insert(id);
            }
        }
        Self::from_ids(chosen)
    }

    /// Ascending iterator over member identifiers.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.intervals.iter().flat_map(Interval::ids)
    }

    /// Member intervals with adjacent ones merged.
    fn coalesced(&self) -> impl Iterator<Item = Interval> + '_ {
        let mut intervals = self.intervals.iter().copied().peekable();
        std::iter::from_fn(move || {
            let mut current = intervals.next()?;
            while let Some(combined) = intervals.peek().and_then(|next| current.union(next)) {
                current = combined;
                intervals.next();
            }
            Some(current)
        })
    }
}

/// The interval `[min, max]`, for callers that have already checked the order.
fn span(min: u64, max: u64) -> Interval {
    Interval::new(min, max).unwrap_or(Interval::single(min))
}

/// `round(count * fraction)`, clamped to `[0, count]`.
fn fraction_offset(count: u64, fraction: f64) -> u64 {
    if fraction <= 0.0 {
        0
    } else if fraction >= 1.0 {
        count
    } else {
        ((count as f64 * fraction).round() as u64).min(count)
    }
}

/// Merge two sorted interval slices into one sorted sequence.
fn merge_sorted<'a>(
    left: &'a [Interval],
    right: &'a [Interval],
) -> impl Iterator<Item = Interval> + 'a {
    let mut left = left.iter().copied().peekable();
    let mut right = right.iter().copied().peekable();
    std::iter::from_fn(move || match (left.peek(), right.peek()) {
        (Some(l), Some(r)) if r < l => right.next(),
        (Some(_), _) => left.next(),
        (None, _) => right.next(),
    })
}

impl PartialEq for IntervalSet {
    fn eq(&self, other: &Self) -> bool {
        self.coalesced().eq(other.coalesced())
    }
}

impl Eq for IntervalSet {}

impl From<Interval> for IntervalSet {
    fn from(interval: Interval) -> Self {
        Self::from_interval(interval)
    }
}

impl fmt::Display for IntervalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, interval) in self.intervals.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{interval}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn interval(min: u64, max: u64) -> Interval {
        Interval::new(min, max).unwrap()
    }

    fn set(ranges: &[(u64, u64)]) -> IntervalSet {
        let mut set = IntervalSet::new();
        for &(min, max) in ranges {
            set.insert(interval(min, max)).unwrap();
        }
        set
    }

    #[test]
    fn test_empty_by_default() {
        let set = IntervalSet::new();
        assert_eq!(set.count(), 0);
        assert!(set.is_empty());
        assert_eq!(set.first(), None);
        assert_eq!(set.last(), None);
        assert_eq!(set.at(0), None);
        assert_eq!(set.at(-1), None);
    }

    #[test]
    fn test_from_range() {
        let set = IntervalSet::from_range(2, 21).unwrap();
        assert_eq!(set.count(), 20);
        assert!(IntervalSet::from_range(5, 1).is_err());
    }

    #[test]
    fn test_full() {
        assert_eq!(IntervalSet::full(0).count(), 0);
        let set = IntervalSet::full(1_000_000);
        assert_eq!(set.count(), 1_000_000);
        assert_eq!(set.first(), Some(0));
        assert_eq!(set.last(), Some(999_999));
    }

    #[test]
    fn test_insert_keeps_order() {
        let set = set(&[(11, 16), (4, 9)]);
        let ids: Vec<u64> = set.iter().collect();
        let expected: Vec<u64> = (4..=9).chain(11..=16).collect();
        assert_eq!(ids, expected);
        assert_eq!(set.intervals(), &[interval(4, 9), interval(11, 16)]);
    }

    #[test]
    fn test_insert_rejects_overlap() {
        let mut set = set(&[(4, 9), (11, 16)]);
        let err = set.insert(interval(9, 10)).unwrap_err();
        assert_eq!(
            err,
            IntervalError::Overlap {
                new: interval(9, 10),
                existing: interval(4, 9),
            }
        );
        assert!(set.insert(interval(16, 20)).is_err());
        assert!(set.insert(interval(10, 10)).is_ok());
        assert_eq!(set.intervals().len(), 3);
    }

    #[test]
    fn test_large_values() {
        let set = IntervalSet::from_range(7, 1_000_000_000_000_000).unwrap();
        assert_eq!(set.first(), Some(7));
        assert_eq!(set.last(), Some(1_000_000_000_000_000));
    }

    #[test]
    fn test_at() {
        let set = set(&[(11, 16), (4, 9)]);
        assert_eq!(set.at(0), Some(4));
        assert_eq!(set.at(7), Some(12));
        assert_eq!(set.at(11), Some(16));
        assert_eq!(set.at(12), None);
        assert_eq!(set.at(16), None);
        assert_eq!(set.at(-1), Some(16));
        assert_eq!(set.at(-12), Some(4));
        assert_eq!(set.at(-13), None);
    }

    #[test]
    fn test_index_of() {
        let set = set(&[(11, 16), (4, 9)]);
        assert_eq!(set.index_of(12), Some(7));
        assert_eq!(set.index_of(4), Some(0));
        assert_eq!(set.index_of(10), None);
        assert_eq!(set.index_of(3), None);
        assert_eq!(set.index_of(17), None);
    }

    #[test]
    fn test_index_round_trip() {
        let set = set(&[(0, 3), (10, 10), (20, 29), (100, 104)]);
        for id in set.iter() {
            let index = set.index_of(id).unwrap();
            assert_eq!(set.at(index as i64), Some(id));
        }
        for id in [4, 9, 11, 19, 30, 99, 105] {
            assert_eq!(set.index_of(id), None);
            assert!(!set.contains(id));
        }
    }

    #[test]
    fn test_contains() {
        let set = set(&[(4, 9), (11, 16)]);
        assert!(set.contains(4));
        assert!(set.contains(16));
        assert!(!set.contains(10));
        assert!(!set.contains(0));
        assert!(!set.contains(17));
    }

    #[test]
    fn test_union_merges_adjacent() {
        let left = set(&[(0, 4), (10, 14)]);
        let right = set(&[(5, 6), (12, 20), (30, 31)]);
        let union = left.union(&right);
        assert_eq!(
            union.intervals(),
            &[interval(0, 6), interval(10, 20), interval(30, 31)]
        );
        assert_eq!(union.count(), 7 + 11 + 2);
    }

    #[test]
    fn test_disjoint_union_keeps_boundaries() {
        let left = set(&[(0, 4), (10, 14)]);
        let right = set(&[(5, 9)]);
        let joined = left.disjoint_union(&right).unwrap();
        assert_eq!(
            joined.intervals(),
            &[interval(0, 4), interval(5, 9), interval(10, 14)]
        );
        assert!(left.disjoint_union(&set(&[(3, 5)])).is_err());
    }

    #[test]
    fn test_intersect() {
        let left = set(&[(0, 9), (20, 29)]);
        let right = set(&[(5, 24), (28, 40)]);
        let both = left.intersect(&right);
        assert_eq!(
            both.intervals(),
            &[interval(5, 9), interval(20, 24), interval(28, 29)]
        );
        assert!(left.intersect(&IntervalSet::new()).is_empty());
    }

    #[test]
    fn test_difference() {
        let left = set(&[(0, 9), (20, 29)]);
        let right = set(&[(3, 4), (8, 21), (25, 25)]);
        let diff = left.difference(&right);
        assert_eq!(
            diff.intervals(),
            &[
                interval(0, 2),
                interval(5, 7),
                interval(22, 24),
                interval(26, 29)
            ]
        );
        assert_eq!(left.difference(&IntervalSet::new()), left);
        assert!(left.difference(&left).is_empty());
    }

    #[test]
    fn test_algebra_laws() {
        let a = set(&[(0, 9), (20, 29), (50, 50)]);
        let b = set(&[(5, 24), (28, 40)]);
        let c = set(&[(8, 8), (22, 60)]);
        let empty = IntervalSet::new();

        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.intersect(&b), b.intersect(&a));
        assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        assert_eq!(a.intersect(&b).intersect(&c), a.intersect(&b.intersect(&c)));
        assert_eq!(a.intersect(&a), a);
        assert_eq!(a.union(&empty), a);
        assert!(a.intersect(&empty).is_empty());
    }

    #[test]
    fn test_equality_ignores_boundaries() {
        let split = set(&[(0, 4), (5, 9)]);
        let whole = set(&[(0, 9)]);
        assert_eq!(split, whole);
        assert_ne!(split, set(&[(0, 8)]));
    }

    #[test]
    fn test_scale_partitions_exactly() {
        let set = set(&[(0, 999), (2000, 2006)]);
        let probabilities = [0.3, 0.1, 0.01, 0.5, 0.09];
        let mut cumulative = 0.0;
        let mut parts = Vec::new();
        for (idx, p) in probabilities.iter().enumerate() {
            let lo = cumulative;
            cumulative += p;
            let hi = if idx == probabilities.len() - 1 { 1.0 } else { cumulative };
            parts.push(set.scale(lo, hi));
        }

        let total: u64 = parts.iter().map(IntervalSet::count).sum();
        assert_eq!(total, set.count());

        let mut rebuilt = IntervalSet::new();
        for part in &parts {
            rebuilt = rebuilt.disjoint_union(part).unwrap();
        }
        assert_eq!(rebuilt, set);
        assert_eq!(parts[0].intervals()[0], interval(0, 299));
    }

    #[test]
    fn test_scale_drops_empty_spans() {
        let set = set(&[(0, 1)]);
        assert!(set.scale(0.0, 0.1).is_empty());
        assert_eq!(set.scale(0.0, 1.0), set);
    }

    #[test]
    fn test_sample() {
        let set = set(&[(4, 9), (11, 16), (1000, 100_000)]);
        let mut rng = StdRng::seed_from_u64(42);

        let sample = set.sample(10, &mut rng);
        assert_eq!(sample.count(), 10);
        assert!(sample.iter().all(|id| set.contains(id)));

        let small = IntervalSet::from_range(3, 5).unwrap();
        let everything = small.sample(10, &mut rng);
        assert_eq!(everything, small);

        assert!(IntervalSet::new().sample(3, &mut rng).is_empty());
    }

    #[test]
    fn test_sample_deterministic() {
        let set = IntervalSet::full(1_000_000);
        let a = set.sample(25, &mut StdRng::seed_from_u64(7));
        let b = set.sample(25, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.intervals(), b.intervals());
    }

    #[test]
    fn test_display() {
        let set = set(&[(11, 16), (4, 9)]);
        assert_eq!(set.to_string(), "[[4, 9], [11, 16]]");
    }
}
