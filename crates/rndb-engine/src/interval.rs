//! Closed integer intervals over the identifier space.

use std::cmp::Ordering;
use std::fmt;

/// Error type for interval construction and interval-set insertion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    /// `min` greater than `max`
    #[error("Interval [{min}, {max}] has min greater than max")]
    Inverted { min: u64, max: u64 },

    /// Interval overlaps a member of the set it was added to
    #[error("Interval {new} overlaps existing interval {existing}")]
    Overlap { new: Interval, existing: Interval },
}

/// Closed, inclusive range `[min, max]` of identifiers.
///
/// Intervals order by `min`; inside an interval set they are disjoint, so
/// this is also the order of their `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    min: u64,
    max: u64,
}

impl Interval {
    /// Create the interval `[min, max]`.
    pub fn new(min: u64, max: u64) -> Result<Self, IntervalError> {
        if min > max {
            return Err(IntervalError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// The interval holding a single identifier.
    pub fn single(id: u64) -> Self {
        Self { min: id, max: id }
    }

    /// Smallest member.
    pub fn start(&self) -> u64 {
        self.min
    }

    /// Largest member.
    pub fn end(&self) -> u64 {
        self.max
    }

    /// Number of identifiers in the interval; always at least one.
    pub fn count(&self) -> u64 {
        self.max - self.min + 1
    }

    /// Whether `id` lies within the interval.
    pub fn contains(&self, id: u64) -> bool {
        self.min <= id && id <= self.max
    }

    /// Whether the two intervals share at least one identifier.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Identifiers present in both intervals, if any.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Smallest interval covering both, when they overlap or touch.
    ///
    /// Returns `None` when a gap separates them, since the union would not
    /// be an interval.
    pub fn union(&self, other: &Interval) -> Option<Interval> {
        let (first, second) = if self.min <= other.min {
            (self, other)
        } else {
            (other, self)
        };
        if second.min > first.max.saturating_add(1) {
            return None;
        }
        Some(Self {
            min: first.min,
            max: first.max.max(second.max),
        })
    }

    /// Ascending iterator over the identifiers of the interval.
    pub fn ids(&self) -> std::ops::RangeInclusive<u64> {
        self.min..=self.max
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.min.cmp(&other.min).then(self.max.cmp(&other.max))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(min: u64, max: u64) -> Interval {
        Interval::new(min, max).unwrap()
    }

    #[test]
    fn test_count() {
        let slice = interval(5, 13);
        assert_eq!(slice.count(), slice.ids().count() as u64);
        assert_eq!(Interval::single(4).count(), 1);
    }

    #[test]
    fn test_inverted_interval_rejected() {
        assert_eq!(
            Interval::new(9, 3),
            Err(IntervalError::Inverted { min: 9, max: 3 })
        );
    }

    #[test]
    fn test_intersect() {
        assert_eq!(interval(5, 13).intersect(&interval(10, 17)), Some(interval(10, 13)));
        assert_eq!(interval(10, 17).intersect(&interval(5, 13)), Some(interval(10, 13)));
        assert_eq!(interval(5, 10).intersect(&interval(12, 17)), None);
        assert_eq!(interval(5, 10).intersect(&interval(10, 17)), Some(interval(10, 10)));
    }

    #[test]
    fn test_union() {
        assert_eq!(interval(5, 13).union(&interval(10, 17)), Some(interval(5, 17)));
        assert_eq!(interval(5, 9).union(&interval(10, 17)), Some(interval(5, 17)));
        assert_eq!(interval(12, 17).union(&interval(5, 10)), None);
        assert_eq!(interval(2, 20).union(&interval(5, 10)), Some(interval(2, 20)));
    }

    #[test]
    fn test_ordering_by_min() {
        let mut intervals = vec![interval(11, 16), interval(4, 9)];
        intervals.sort();
        assert_eq!(intervals, vec![interval(4, 9), interval(11, 16)]);
    }

    #[test]
    fn test_bounds_of_owned_interval() {
        let owned = interval(3, 8);
        assert_eq!(owned.start(), 3);
        assert_eq!(owned.end(), 8);
        assert_eq!(std::cmp::max(owned, interval(1, 2)), owned);
    }

    #[test]
    fn test_large_values() {
        let slice = interval(7, 1_000_000_000_000_000);
        assert_eq!(slice.count(), 1_000_000_000_000_000 - 6);
        assert!(slice.contains(999_999_999_999_999));
    }
}
