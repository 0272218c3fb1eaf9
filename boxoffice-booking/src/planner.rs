use crate::pool::PoolManager;
use crate::{BookingError, BookingResult};
use boxoffice_core::Fragment;
use std::cmp::Ordering;
use tracing::debug;

/// Greedy seat planner.
///
/// Keeps parties together where it can: while the largest free fragment is no bigger than what is
/// still needed, that fragment is taken whole (cheapest first among equally large ones). The rest
/// comes out of a single fragment as its cheapest run of seats.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationPlanner;

impl AllocationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Plan `seats` against a snapshot of the pool. Nothing is claimed.
    pub fn plan(&self, pool: &PoolManager, seats: u32) -> BookingResult<Vec<Fragment>> {
        self.plan_from(pool.available_fragments(), seats)
    }

    /// Plan `seats` out of `available`, which the planner is free to consume
    pub fn plan_from(&self, mut available: Vec<Fragment>, seats: u32) -> BookingResult<Vec<Fragment>> {
        if seats == 0 {
            return Err(BookingError::InvalidQuantity(seats));
        }

        let total: u32 = available.iter().map(Fragment::size).sum();
        if total < seats {
            return Err(BookingError::Unavailable {
                requested: seats,
                available: total,
            });
        }

        let mut needed = seats;
        let mut chosen = Vec::new();
        while needed > 0 {
            let largest = available.iter().map(Fragment::size).max().unwrap_or(0);

            if largest > 0 && largest <= needed {
                let index = available
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| f.size() == largest)
                    .min_by(|(_, a), (_, b)| cheapest_first(a, b))
                    .map(|(i, _)| i);
                let Some(index) = index else { break };

                let whole = available.swap_remove(index);
                needed -= whole.size();
                chosen.push(whole);
            } else {
                let window = available
                    .iter()
                    .filter_map(|f| f.best_sub_window(needed))
                    .min_by(cheapest_first);
                let Some(window) = window else { break };

                needed = 0;
                chosen.push(window);
            }
        }

        if needed > 0 {
            return Err(BookingError::Unavailable {
                requested: seats,
                available: total,
            });
        }

        debug!("Planned {} seats across {} fragments", seats, chosen.len());
        Ok(chosen)
    }
}

fn cheapest_first(a: &Fragment, b: &Fragment) -> Ordering {
    a.total_cost()
        .total_cmp(&b.total_cost())
        .then_with(|| a.block().cmp(&b.block()))
        .then_with(|| a.start().cmp(&b.start()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_catalog::{SquareVenue, Venue, VenueSpec};
    use boxoffice_core::Seat;
    use boxoffice_shared::ManualClock;
    use std::sync::Arc;

    fn row(block: u32, first: u32, costs: &[f64]) -> Fragment {
        Fragment::new(
            costs
                .iter()
                .enumerate()
                .map(|(i, c)| Seat::new(block, first + i as u32, *c))
                .collect(),
        )
        .unwrap()
    }

    fn default_pool() -> PoolManager {
        let venue = SquareVenue::new(VenueSpec::default());
        PoolManager::new(venue.fragments().to_vec(), Arc::new(ManualClock::default()))
    }

    #[test]
    fn test_equal_windows_prefer_rightmost() {
        // seats numbered 1..=3
        let planner = AllocationPlanner::new();
        let plan = planner.plan_from(vec![row(0, 1, &[1.0, 0.0, 1.0])], 2).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!((plan[0].start(), plan[0].end()), (2, 3));
        assert!((plan[0].total_cost() - 1.0).abs() < 0.00001);
    }

    #[test]
    fn test_single_seat_is_the_ideal_one() {
        let pool = default_pool();
        let plan = AllocationPlanner::new().plan(&pool, 1).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!((plan[0].block(), plan[0].start()), (0, 50));
        assert_eq!(plan[0].total_cost(), 0.0);
    }

    #[test]
    fn test_whole_rows_before_windows() {
        let pool = default_pool();
        let plan = AllocationPlanner::new().plan(&pool, 200).unwrap();
        assert_eq!(plan.len(), 2);
        // the two rows closest to the ideal seat
        let blocks: Vec<u32> = plan.iter().map(Fragment::block).collect();
        assert_eq!(blocks, vec![0, 1]);
        assert!(plan.iter().all(|f| f.size() == 100));
    }

    #[test]
    fn test_remainder_comes_from_one_window() {
        let pool = default_pool();
        let plan = AllocationPlanner::new().plan(&pool, 150).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].block(), 0);
        assert_eq!(plan[0].size(), 100);
        assert_eq!(plan[1].block(), 1);
        assert_eq!(plan[1].size(), 50);
        // centred on the ideal seat column
        assert!(plan[1].start() >= 25 && plan[1].end() <= 75);
    }

    #[test]
    fn test_planning_does_not_claim() {
        let pool = default_pool();
        AllocationPlanner::new().plan(&pool, 500).unwrap();
        assert_eq!(pool.total_available(), 10_000);
    }

    #[test]
    fn test_larger_fragment_covers_remainder() {
        // largest (4) exceeds need (3): take the cheapest 3-run, from whichever fragment
        let planner = AllocationPlanner::new();
        let plan = planner
            .plan_from(
                vec![row(0, 0, &[5.0, 5.0, 5.0, 5.0]), row(1, 0, &[1.0, 1.0, 1.0])],
                3,
            )
            .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].block(), 1);
    }

    #[test]
    fn test_ties_go_to_lowest_block() {
        let planner = AllocationPlanner::new();
        let plan = planner
            .plan_from(vec![row(3, 0, &[1.0, 1.0]), row(2, 0, &[1.0, 1.0])], 2)
            .unwrap();
        assert_eq!(plan[0].block(), 2);
    }

    #[test]
    fn test_too_many_seats() {
        let planner = AllocationPlanner::new();
        let result = planner.plan_from(vec![row(0, 0, &[1.0, 1.0])], 3);
        assert_eq!(
            result.unwrap_err(),
            BookingError::Unavailable {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_zero_seats() {
        let planner = AllocationPlanner::new();
        assert_eq!(
            planner.plan_from(vec![row(0, 0, &[1.0])], 0).unwrap_err(),
            BookingError::InvalidQuantity(0)
        );
    }
}
