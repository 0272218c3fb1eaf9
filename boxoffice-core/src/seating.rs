//! Seats and contiguous seat runs ("fragments").
//!
//! A [`Fragment`] is the unit the pool hands out and takes back: a non-empty run of seats in one
//! block with strictly consecutive positions. Fragments are immutable; every operation here builds
//! new fragments and recomputes their derived fields.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single seat. `cost` is lower for more desirable seats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub block: u32,
    pub position: u32,
    pub cost: f64,
}

impl Seat {
    pub fn new(block: u32, position: u32, cost: f64) -> Self {
        Self {
            block,
            position,
            cost,
        }
    }
}

/// A contiguous run of seats within one block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    block: u32,
    start: u32,
    end: u32,
    total_cost: f64,
    seats: Vec<Seat>,
}

impl Fragment {
    /// Build a fragment, checking that the seats are non-empty, share a block and ascend without gaps.
    pub fn new(seats: Vec<Seat>) -> CoreResult<Self> {
        let first = seats
            .first()
            .ok_or_else(|| CoreError::InvalidFragment("empty seat list".to_string()))?;

        if seats.iter().any(|s| s.block != first.block) {
            return Err(CoreError::InvalidFragment(
                "more than one block identifier found".to_string(),
            ));
        }

        for pair in seats.windows(2) {
            if pair[0].position.checked_add(1) != Some(pair[1].position) {
                return Err(CoreError::InvalidFragment(format!(
                    "positions are not contiguous, went from: {} -> {}",
                    pair[0].position, pair[1].position
                )));
            }
        }

        Ok(Self::from_run(seats))
    }

    /// Derive the cached fields for a run already known to be valid.
    fn from_run(seats: Vec<Seat>) -> Self {
        debug_assert!(!seats.is_empty());
        let first = seats[0];
        let last = seats[seats.len() - 1];
        Self {
            block: first.block,
            start: first.position,
            end: last.position,
            total_cost: seats.iter().map(|s| s.cost).sum(),
            seats,
        }
    }

    pub fn block(&self) -> u32 {
        self.block
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn size(&self) -> u32 {
        self.seats.len() as u32
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    fn same_range(&self, other: &Fragment) -> bool {
        self.block == other.block && self.start == other.start && self.end == other.end
    }

    /// True iff `other` lies entirely within this fragment.
    pub fn contains(&self, other: &Fragment) -> bool {
        self.block == other.block && self.start <= other.start && self.end >= other.end
    }

    /// True iff both fragments are in the same block and one ends right where the other begins.
    pub fn is_contiguous_with(&self, other: &Fragment) -> bool {
        self.block == other.block
            && (self.end.checked_add(1) == Some(other.start)
                || other.end.checked_add(1) == Some(self.start))
    }

    /// Remove `other`'s seats from this fragment.
    ///
    /// Yields nothing when the ranges are equal, one piece when `other` touches an end,
    /// and two pieces (left, then right) when it sits strictly inside.
    pub fn subtract(&self, other: &Fragment) -> CoreResult<Vec<Fragment>> {
        if !self.contains(other) {
            return Err(CoreError::NotContained {
                outer: self.to_string(),
                inner: other.to_string(),
            });
        }
        if self.same_range(other) {
            return Ok(Vec::new());
        }

        let lo = (other.start - self.start) as usize;
        let hi = (other.end - self.start) as usize;
        let mut pieces = Vec::with_capacity(2);
        if lo > 0 {
            pieces.push(Self::from_run(self.seats[..lo].to_vec()));
        }
        if hi + 1 < self.seats.len() {
            pieces.push(Self::from_run(self.seats[hi + 1..].to_vec()));
        }
        Ok(pieces)
    }

    /// This fragment's own seats over `other`'s range. Costs come from `self`, never from `other`.
    pub fn carve(&self, other: &Fragment) -> CoreResult<Fragment> {
        if !self.contains(other) {
            return Err(CoreError::NotContained {
                outer: self.to_string(),
                inner: other.to_string(),
            });
        }

        let lo = (other.start - self.start) as usize;
        let hi = (other.end - self.start) as usize;
        Ok(Self::from_run(self.seats[lo..=hi].to_vec()))
    }

    /// Join two contiguous fragments into one, in position order.
    pub fn merge(&self, other: &Fragment) -> CoreResult<Fragment> {
        if !self.is_contiguous_with(other) {
            return Err(CoreError::NotContiguous {
                left: self.to_string(),
                right: other.to_string(),
            });
        }

        let (left, right) = if self.start < other.start {
            (self, other)
        } else {
            (other, self)
        };
        let mut seats = Vec::with_capacity(left.seats.len() + right.seats.len());
        seats.extend_from_slice(&left.seats);
        seats.extend_from_slice(&right.seats);
        Ok(Self::from_run(seats))
    }

    /// Cheapest run of `n` seats inside this fragment.
    ///
    /// `None` when `n` is zero or larger than the fragment. Windows are scanned left to right and a
    /// window replaces the current best when its cost is less than or equal to it, so among
    /// equally cheap windows the rightmost one is returned.
    pub fn best_sub_window(&self, n: u32) -> Option<Fragment> {
        let n = n as usize;
        if n == 0 || n > self.seats.len() {
            return None;
        }
        if n == self.seats.len() {
            return Some(self.clone());
        }

        let mut best_start = 0;
        let mut best_cost = f64::INFINITY;
        for (i, window) in self.seats.windows(n).enumerate() {
            let cost: f64 = window.iter().map(|s| s.cost).sum();
            if cost <= best_cost {
                best_cost = cost;
                best_start = i;
            }
        }
        Some(Self::from_run(
            self.seats[best_start..best_start + n].to_vec(),
        ))
    }

    /// Cost of the seat at (`block`, `position`), if this fragment covers it.
    pub fn seat_cost(&self, block: u32, position: u32) -> Option<f64> {
        if block != self.block || position < self.start || position > self.end {
            return None;
        }
        self.seats
            .get((position - self.start) as usize)
            .map(|s| s.cost)
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {} [{}..={}]", self.block, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 0.00001;

    fn run(block: u32, start: u32, costs: &[f64]) -> Fragment {
        let seats = costs
            .iter()
            .enumerate()
            .map(|(i, c)| Seat::new(block, start + i as u32, *c))
            .collect();
        Fragment::new(seats).unwrap()
    }

    fn positions(fragment: &Fragment) -> Vec<u32> {
        fragment.seats().iter().map(|s| s.position).collect()
    }

    #[test]
    fn test_derived_fields() {
        let unit = run(1, 1, &[2.0, 0.0, 1.0]);
        assert_eq!(unit.block(), 1);
        assert_eq!(unit.start(), 1);
        assert_eq!(unit.end(), 3);
        assert_eq!(unit.size(), 3);
        assert!((unit.total_cost() - 3.0).abs() < EPSILON);
    }

    #[test]
    fn test_rejects_malformed_runs() {
        assert!(matches!(
            Fragment::new(vec![]),
            Err(CoreError::InvalidFragment(_))
        ));

        // skipped position 2
        let gap = vec![Seat::new(1, 1, 1.0), Seat::new(1, 3, 1.0)];
        assert!(matches!(Fragment::new(gap), Err(CoreError::InvalidFragment(_))));

        let mixed = vec![Seat::new(1, 1, 1.0), Seat::new(2, 2, 1.0)];
        assert!(matches!(Fragment::new(mixed), Err(CoreError::InvalidFragment(_))));

        let descending = vec![Seat::new(1, 2, 1.0), Seat::new(1, 1, 1.0)];
        assert!(matches!(
            Fragment::new(descending),
            Err(CoreError::InvalidFragment(_))
        ));
    }

    #[test]
    fn test_contiguity() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        let b = run(1, 4, &[1.0, 0.0]);
        let c = run(1, 6, &[1.0, 0.0]);
        let other_block = run(2, 4, &[4.0]);

        assert!(a.is_contiguous_with(&b));
        assert!(b.is_contiguous_with(&a));
        assert!(!a.is_contiguous_with(&c));
        assert!(!c.is_contiguous_with(&a));
        assert!(!a.is_contiguous_with(&other_block));
    }

    #[test]
    fn test_contains() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        let tail = run(1, 2, &[0.0, 1.0]);
        assert!(a.contains(&a));
        assert!(a.contains(&tail));
        assert!(!tail.contains(&a));
        assert!(!a.contains(&run(2, 2, &[0.0])));
    }

    #[test]
    fn test_merge_in_either_order() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        let b = run(1, 4, &[1.0, 0.0]);
        let c = run(1, 6, &[1.0, 0.0]);

        let ab = a.merge(&b).unwrap();
        assert_eq!(ab.size(), 5);
        assert_eq!(positions(&ab), vec![1, 2, 3, 4, 5]);

        let abc = c.merge(&ab).unwrap();
        assert_eq!(abc.size(), 7);
        assert_eq!(abc.start(), 1);
        assert_eq!(abc.end(), 7);
        assert!((abc.total_cost() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_merge_fails_if_not_contiguous() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        let c = run(1, 6, &[1.0, 0.0]);
        assert!(matches!(a.merge(&c), Err(CoreError::NotContiguous { .. })));
    }

    #[test]
    fn test_subtract() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);

        assert!(matches!(
            a.subtract(&run(1, 6, &[1.0, 0.0])),
            Err(CoreError::NotContained { .. })
        ));

        let pieces = a.subtract(&run(1, 2, &[0.0, 1.0])).unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].size(), 1);
        assert_eq!(pieces[0].start(), 1);
        assert_eq!(pieces[0].end(), 1);
        assert_eq!(pieces[0].block(), 1);

        assert!(a.subtract(&a).unwrap().is_empty());
    }

    #[test]
    fn test_subtract_from_middle() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        let pieces = a.subtract(&run(1, 2, &[0.0])).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(positions(&pieces[0]), vec![1]);
        assert_eq!(positions(&pieces[1]), vec![3]);
        assert!((pieces[0].total_cost() - 2.0).abs() < EPSILON);
        assert!((pieces[1].total_cost() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_carve_keeps_own_costs() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        let forged = run(1, 2, &[999.0, 999.0]);

        let carved = a.carve(&forged).unwrap();
        assert_eq!(positions(&carved), vec![2, 3]);
        assert!((carved.total_cost() - 1.0).abs() < EPSILON);

        assert!(matches!(
            a.carve(&run(1, 3, &[1.0, 1.0])),
            Err(CoreError::NotContained { .. })
        ));
    }

    #[test]
    fn test_best_sub_window_extremes() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        assert_eq!(a.best_sub_window(3), Some(a.clone()));
        assert_eq!(a.best_sub_window(4), None);
        assert_eq!(a.best_sub_window(0), None);
    }

    #[test]
    fn test_best_sub_window_picks_cheapest() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);

        let pair = a.best_sub_window(2).unwrap();
        assert_eq!(positions(&pair), vec![2, 3]);
        assert!((pair.total_cost() - 1.0).abs() < EPSILON);

        let single = a.best_sub_window(1).unwrap();
        assert_eq!(positions(&single), vec![2]);
    }

    #[test]
    fn test_best_sub_window_tie_goes_to_last_window() {
        // [1,0] and [0,1] both cost 1; the scan keeps the later one
        let a = run(1, 1, &[1.0, 0.0, 1.0]);
        let pair = a.best_sub_window(2).unwrap();
        assert_eq!(positions(&pair), vec![2, 3]);

        let flat = run(0, 0, &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(positions(&flat.best_sub_window(1).unwrap()), vec![3]);
    }

    #[test]
    fn test_seat_cost_lookup() {
        let a = run(1, 1, &[2.0, 0.0, 1.0]);
        assert_eq!(a.seat_cost(1, 1), Some(2.0));
        assert_eq!(a.seat_cost(1, 3), Some(1.0));
        assert_eq!(a.seat_cost(1, 4), None);
        assert_eq!(a.seat_cost(2, 1), None);
    }

    fn fragment_with_inner() -> impl Strategy<Value = (Fragment, Fragment)> {
        (0u32..4, 0u32..50, prop::collection::vec(0.0f64..10.0, 1..20)).prop_flat_map(
            |(block, start, costs)| {
                let len = costs.len();
                (Just((block, start, costs)), 0..len).prop_flat_map(move |(base, lo)| {
                    (Just(base), Just(lo), lo..len)
                })
            },
        )
        .prop_map(|((block, start, costs), lo, hi)| {
            let outer = run(block, start, &costs);
            let inner = Fragment::new(outer.seats()[lo..=hi].to_vec()).unwrap();
            (outer, inner)
        })
    }

    proptest! {
        #[test]
        fn prop_subtract_conserves_seats((outer, inner) in fragment_with_inner()) {
            let pieces = outer.subtract(&inner).unwrap();
            let remaining: u32 = pieces.iter().map(|p| p.size()).sum();
            prop_assert_eq!(remaining, outer.size() - inner.size());
            for piece in &pieces {
                prop_assert!(piece.end() < inner.start() || piece.start() > inner.end());
                prop_assert!(outer.contains(piece));
            }
        }

        #[test]
        fn prop_merge_then_subtract_round_trips((outer, inner) in fragment_with_inner()) {
            // rebuild `outer` from its pieces and check we can take each one back out
            let mut rebuilt = inner.clone();
            for piece in outer.subtract(&inner).unwrap() {
                rebuilt = rebuilt.merge(&piece).unwrap();
            }
            prop_assert_eq!(&rebuilt, &outer);

            let without_inner: Vec<Fragment> = rebuilt.subtract(&inner).unwrap();
            let seats: Vec<u32> = without_inner.iter().flat_map(positions).collect();
            let expected: Vec<u32> = positions(&outer)
                .into_iter()
                .filter(|p| *p < inner.start() || *p > inner.end())
                .collect();
            prop_assert_eq!(seats, expected);
        }

        #[test]
        fn prop_best_sub_window_is_minimal((outer, inner) in fragment_with_inner()) {
            let n = inner.size();
            let best = outer.best_sub_window(n).unwrap();
            prop_assert_eq!(best.size(), n);
            prop_assert!(outer.contains(&best));
            prop_assert!(best.total_cost() <= inner.total_cost() + EPSILON);
        }
    }
}
