//! Canonical sorted, disjoint intervals of Unicode scalar values.

use std::collections::BTreeSet;
use std::fmt;

/// One below the highest Unicode scalar value, so that `MAX_CODE_POINT + 1`
/// never overflows a `u32`.
pub const MAX_CODE_POINT: u32 = (char::MAX as u32) - 1;

/// An inclusive `[lo, hi]` interval of code points. `lo > hi` denotes the
/// empty interval and never appears inside a canonical [`RangeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Range {
    pub lo: u32,
    pub hi: u32,
}

impl Range {
    pub fn new(lo: u32, hi: u32) -> Self {
        Range { lo, hi }
    }

    fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// True if `self` and `other` overlap or sit immediately next to each
    /// other, so that merging them produces a single contiguous interval.
    fn touches(&self, other: &Range) -> bool {
        self.lo <= other.hi.saturating_add(1) && other.lo <= self.hi.saturating_add(1)
    }

    fn union(&self, other: &Range) -> Range {
        Range::new(self.lo.min(other.lo), self.hi.max(other.hi))
    }
}

/// A canonical, value-typed set of code points: a strictly increasing,
/// non-overlapping, non-touching sequence of [`Range`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<Range>,
}

impl RangeSet {
    pub fn new() -> Self {
        RangeSet { ranges: Vec::new() }
    }

    pub fn single(c: char) -> Self {
        let mut rs = RangeSet::new();
        rs.add(c as u32, c as u32);
        rs
    }

    pub fn full() -> Self {
        let mut rs = RangeSet::new();
        rs.add(0, MAX_CODE_POINT);
        rs
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Inserts `[lo, hi]`, merging with any overlapping or adjacent
    /// existing interval. A no-op if `lo > hi`.
    pub fn add(&mut self, lo: u32, hi: u32) {
        if lo > hi {
            return;
        }
        self.ranges.push(Range::new(lo, hi));
        self.canonicalize();
    }

    pub fn add_set(&mut self, other: &RangeSet) {
        for r in &other.ranges {
            self.add(r.lo, r.hi);
        }
    }

    fn canonicalize(&mut self) {
        self.ranges.retain(|r| !r.is_empty());
        self.ranges.sort();
        let mut merged: Vec<Range> = Vec::with_capacity(self.ranges.len());
        for r in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if last.touches(&r) => *last = last.union(&r),
                _ => merged.push(r),
            }
        }
        self.ranges = merged;
    }

    pub fn contains(&self, c: u32) -> bool {
        // Ranges are sorted and disjoint, so a binary search on `lo` works.
        match self.ranges.binary_search_by(|r| r.lo.cmp(&c)) {
            Ok(_) => true,
            Err(idx) => idx > 0 && self.ranges[idx - 1].hi >= c,
        }
    }

    /// Complement over `[0, MAX_CODE_POINT]`.
    pub fn invert(&self) -> RangeSet {
        let mut out = RangeSet::new();
        let mut cur = 0u32;
        for r in &self.ranges {
            if cur < r.lo {
                out.add(cur, r.lo - 1);
            }
            cur = r.hi.saturating_add(1);
        }
        if cur <= MAX_CODE_POINT {
            out.add(cur, MAX_CODE_POINT);
        }
        out
    }

    /// Splits `a` and `b` into three canonical, pairwise-disjoint sets:
    /// the part only in `a`, the part in both, and the part only in `b`.
    /// `union(only_a, both) == a` and `union(only_b, both) == b`.
    pub fn diff(a: &RangeSet, b: &RangeSet) -> (RangeSet, RangeSet, RangeSet) {
        let mut points: BTreeSet<u32> = BTreeSet::new();
        for r in a.ranges.iter().chain(b.ranges.iter()) {
            points.insert(r.lo);
            if let Some(next) = r.hi.checked_add(1) {
                points.insert(next);
            }
        }
        let pts: Vec<u32> = points.into_iter().collect();

        let mut only_a = RangeSet::new();
        let mut both = RangeSet::new();
        let mut only_b = RangeSet::new();
        for w in pts.windows(2) {
            let (lo, hi_excl) = (w[0], w[1]);
            if lo >= hi_excl {
                continue;
            }
            let hi = hi_excl - 1;
            match (a.contains(lo), b.contains(lo)) {
                (true, true) => both.add(lo, hi),
                (true, false) => only_a.add(lo, hi),
                (false, true) => only_b.add(lo, hi),
                (false, false) => {}
            }
        }
        (only_a, both, only_b)
    }

    /// Refines a list of (possibly overlapping) classes into the smallest
    /// set of pairwise-disjoint `RangeSet`s whose union equals the union of
    /// the inputs. Used by DFA construction to partition a state's outgoing
    /// transition alphabet.
    pub fn disjoint_alphabet<'a>(classes: impl IntoIterator<Item = &'a RangeSet>) -> Vec<RangeSet> {
        let mut acc: Vec<RangeSet> = Vec::new();
        for class in classes {
            let mut remaining = class.clone();
            let mut next_acc = Vec::with_capacity(acc.len() + 1);
            for existing in &acc {
                let (only_existing, both, only_remaining) = RangeSet::diff(existing, &remaining);
                if !only_existing.is_empty() {
                    next_acc.push(only_existing);
                }
                if !both.is_empty() {
                    next_acc.push(both);
                }
                remaining = only_remaining;
            }
            if !remaining.is_empty() {
                next_acc.push(remaining);
            }
            acc = next_acc;
        }
        acc
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in &self.ranges {
            if r.lo == r.hi {
                write!(f, "{}", char::from_u32(r.lo).unwrap_or('\u{FFFD}'))?;
            } else {
                write!(
                    f,
                    "{}-{}",
                    char::from_u32(r.lo).unwrap_or('\u{FFFD}'),
                    char::from_u32(r.hi).unwrap_or('\u{FFFD}')
                )?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_merges_overlapping_and_adjacent() {
        let mut rs = RangeSet::new();
        rs.add('a' as u32, 'c' as u32);
        rs.add('d' as u32, 'd' as u32);
        assert_eq!(rs.ranges().len(), 1);
        assert_eq!(rs.to_string(), "[a-d]");
    }

    #[test]
    fn add_is_noop_for_empty_range() {
        let mut rs = RangeSet::new();
        rs.add(10, 5);
        assert!(rs.is_empty());
    }

    #[test]
    fn singleton_adjacent_chars_serialize_as_range() {
        let mut rs = RangeSet::new();
        for c in ['a', 'b', 'c', 'd'] {
            rs.add(c as u32, c as u32);
        }
        assert_eq!(rs.to_string(), "[a-d]");
    }

    #[test]
    fn contains_checks_membership() {
        let mut rs = RangeSet::new();
        rs.add('a' as u32, 'z' as u32);
        assert!(rs.contains('m' as u32));
        assert!(!rs.contains('A' as u32));
    }

    #[test]
    fn invert_empty_is_full_and_vice_versa() {
        let empty = RangeSet::new();
        assert_eq!(empty.invert(), RangeSet::full());
        assert_eq!(RangeSet::full().invert(), empty);
    }

    #[test]
    fn invert_is_involutive() {
        let mut rs = RangeSet::new();
        rs.add('a' as u32, 'z' as u32);
        rs.add('0' as u32, '9' as u32);
        assert_eq!(rs.invert().invert(), rs);
    }

    #[test]
    fn diff_partitions_both_sides() {
        let mut a = RangeSet::new();
        a.add('a' as u32, 'm' as u32);
        let mut b = RangeSet::new();
        b.add('g' as u32, 'z' as u32);

        let (only_a, both, only_b) = RangeSet::diff(&a, &b);

        let mut recombined_a = only_a.clone();
        recombined_a.add_set(&both);
        assert_eq!(recombined_a, a);

        let mut recombined_b = only_b.clone();
        recombined_b.add_set(&both);
        assert_eq!(recombined_b, b);

        assert!(both.contains('g' as u32));
        assert!(only_a.contains('a' as u32));
        assert!(only_b.contains('z' as u32));
    }

    #[test]
    fn diff_with_one_side_empty_returns_other_verbatim() {
        let mut a = RangeSet::new();
        a.add('a' as u32, 'z' as u32);
        let b = RangeSet::new();
        let (only_a, both, only_b) = RangeSet::diff(&a, &b);
        assert_eq!(only_a, a);
        assert!(both.is_empty());
        assert!(only_b.is_empty());
    }

    #[test]
    fn disjoint_alphabet_refines_overlapping_classes() {
        let mut a = RangeSet::new();
        a.add('a' as u32, 'm' as u32);
        let mut b = RangeSet::new();
        b.add('g' as u32, 'z' as u32);

        let parts = RangeSet::disjoint_alphabet([&a, &b]);
        // Every pair of parts must be disjoint.
        for i in 0..parts.len() {
            for j in (i + 1)..parts.len() {
                let (_, both, _) = RangeSet::diff(&parts[i], &parts[j]);
                assert!(both.is_empty());
            }
        }
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn build(intervals: &[(u8, u8)]) -> RangeSet {
        let mut rs = RangeSet::new();
        for &(lo, hi) in intervals {
            rs.add(lo as u32, hi as u32);
        }
        rs
    }

    #[quickcheck]
    fn canonical_form_is_order_independent(mut intervals: Vec<(u8, u8)>) -> bool {
        let forward = build(&intervals);
        intervals.reverse();
        let backward = build(&intervals);
        forward == backward
    }

    #[quickcheck]
    fn canonical_form_has_no_touching_neighbors(intervals: Vec<(u8, u8)>) -> bool {
        let rs = build(&intervals);
        rs.ranges().windows(2).all(|w| w[0].hi.saturating_add(1) < w[1].lo)
    }

    #[quickcheck]
    fn invert_is_involution(intervals: Vec<(u8, u8)>) -> bool {
        let rs = build(&intervals);
        rs.invert().invert() == rs
    }

    #[quickcheck]
    fn diff_partition_recombines(a: Vec<(u8, u8)>, b: Vec<(u8, u8)>) -> bool {
        let a = build(&a);
        let b = build(&b);
        let (only_a, both, only_b) = RangeSet::diff(&a, &b);

        let mut recombined_a = only_a.clone();
        recombined_a.add_set(&both);
        let mut recombined_b = only_b.clone();
        recombined_b.add_set(&both);

        recombined_a == a && recombined_b == b
    }
}
