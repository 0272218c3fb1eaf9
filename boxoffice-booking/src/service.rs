use crate::planner::AllocationPlanner;
use crate::pool::{Confirmation, PoolManager};
use crate::{BookingError, BookingResult};
use boxoffice_catalog::{SquareVenue, Venue};
use boxoffice_core::{Hold, HoldId};
use boxoffice_shared::Clock;
use boxoffice_store::{Config, InMemoryLeaseService, LeaseGuard, LeaseService};
use std::sync::Arc;
use tracing::{info, warn};

/// Public face of the box office for one event.
///
/// Placing a hold runs plan-then-allocate under the event's lease, so two concurrent requests
/// never plan against the same snapshot. Everything else goes straight to the pool.
pub struct BookingService {
    event_id: String,
    pool: Arc<PoolManager>,
    leases: Arc<dyn LeaseService>,
    planner: AllocationPlanner,
    hold_minutes: u32,
}

impl BookingService {
    pub fn new(
        event_id: impl Into<String>,
        pool: Arc<PoolManager>,
        leases: Arc<dyn LeaseService>,
        hold_minutes: u32,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            pool,
            leases,
            planner: AllocationPlanner::new(),
            hold_minutes,
        }
    }

    /// Wire up an empty square venue with an in-process lease, as configured
    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let venue = SquareVenue::new(config.venue);
        let pool = Arc::new(PoolManager::new(venue.fragments().to_vec(), clock.clone()));
        // capped so `now + ttl` stays representable
        let ttl = chrono::Duration::seconds(i64::from(
            u32::try_from(config.business_rules.lease_ttl_seconds).unwrap_or(u32::MAX),
        ));
        let leases = Arc::new(InMemoryLeaseService::new(clock, ttl));

        info!(
            "Event {} opened with {} seats, holds last {} minutes",
            config.event.id,
            venue.capacity(),
            config.business_rules.hold_minutes
        );
        Self::new(
            config.event.id.clone(),
            pool,
            leases,
            config.business_rules.hold_minutes,
        )
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Ids of the events on sale
    pub fn events(&self) -> Vec<String> {
        vec![self.event_id.clone()]
    }

    pub fn hold_minutes(&self) -> u32 {
        self.hold_minutes
    }

    pub fn pool(&self) -> &PoolManager {
        &self.pool
    }

    pub fn seats_available(&self) -> u32 {
        self.pool.total_available()
    }

    /// Find and hold the best `num_seats` seats for `email`
    pub fn hold_seats(&self, num_seats: u32, email: &str) -> BookingResult<Hold> {
        if num_seats == 0 {
            return Err(BookingError::InvalidQuantity(num_seats));
        }
        if email.trim().is_empty() {
            return Err(BookingError::InvalidOwner);
        }

        let _lease = LeaseGuard::acquire(self.leases.as_ref(), &self.event_id).map_err(|err| {
            warn!("Hold request for {} seats refused: {}", num_seats, err);
            BookingError::from(err)
        })?;

        let plan = self.planner.plan(&self.pool, num_seats)?;
        self.pool.allocate(&plan, email, self.hold_minutes)
    }

    pub fn confirm(&self, hold_id: HoldId, email: &str) -> BookingResult<Confirmation> {
        self.pool.confirm(hold_id, email)
    }

    pub fn hold(&self, hold_id: HoldId, email: &str) -> BookingResult<Hold> {
        self.pool.hold(hold_id, email)
    }

    pub fn holds(&self) -> Vec<Hold> {
        self.pool.holds()
    }
}
