//! Seat pool for a single event.
//!
//! Every seat is in exactly one place: an available fragment or a live hold. Available fragments
//! are kept maximal, so no two of them are adjacent in the same block. All mutation happens under
//! one mutex, which makes allocation all-or-nothing and lets sweeps race with allocations safely.

use crate::{BookingError, BookingResult};
use boxoffice_core::{Fragment, Hold, HoldId};
use boxoffice_shared::Clock;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Available fragments are keyed by `(block, start)`, so neighbours are a range lookup away.
type FragmentKey = (u32, u32);

fn key_of(fragment: &Fragment) -> FragmentKey {
    (fragment.block(), fragment.start())
}

#[derive(Debug, Default)]
struct PoolState {
    available: BTreeMap<FragmentKey, Fragment>,
    holds: BTreeMap<HoldId, Hold>,
}

impl PoolState {
    fn total_available(&self) -> u32 {
        self.available.values().map(Fragment::size).sum()
    }

    /// The only available fragment that could contain `wanted`, since available fragments never overlap
    fn source_of(&self, wanted: &Fragment) -> Option<FragmentKey> {
        self.available
            .range(..=key_of(wanted))
            .next_back()
            .filter(|(_, candidate)| candidate.contains(wanted))
            .map(|(key, _)| *key)
    }

    /// Return a fragment to the pool, coalescing with the left neighbour and then the right one.
    fn release(&mut self, fragment: Fragment) {
        let mut merged = fragment;

        let left = self
            .available
            .range(..key_of(&merged))
            .next_back()
            .filter(|(_, neighbour)| neighbour.is_contiguous_with(&merged))
            .map(|(key, _)| *key);
        if let Some(key) = left {
            merged = self.absorb(key, merged);
        }

        let right = merged.end().checked_add(1).map(|next| (merged.block(), next));
        if let Some(key) = right {
            merged = self.absorb(key, merged);
        }

        self.available.insert(key_of(&merged), merged);
    }

    fn absorb(&mut self, key: FragmentKey, fragment: Fragment) -> Fragment {
        let Some(neighbour) = self.available.remove(&key) else {
            return fragment;
        };
        match fragment.merge(&neighbour) {
            Ok(joined) => joined,
            Err(err) => {
                warn!("Could not coalesce {} with {}: {}", fragment, neighbour, err);
                self.available.insert(key, neighbour);
                fragment
            }
        }
    }

    /// Drop every hold that is no longer valid at `now` and give its seats back.
    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<HoldId> = self
            .holds
            .values()
            .filter(|hold| !hold.is_valid(now))
            .map(Hold::id)
            .collect();

        for id in &expired {
            if let Some(hold) = self.holds.remove(id) {
                info!("Hold {} expired, releasing {} seats", id, hold.seat_count());
                for fragment in hold.into_fragments() {
                    self.release(fragment);
                }
            }
        }

        if !expired.is_empty() {
            debug!("Sweep released {} holds", expired.len());
        }
        expired.len()
    }
}

/// A hold that just became a reservation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub hold_id: HoldId,
    pub code: String,
    pub confirmed_at: DateTime<Utc>,
}

/// Owns the available fragments and the live holds of one event.
pub struct PoolManager {
    state: Mutex<PoolState>,
    clock: Arc<dyn Clock>,
    next_hold_id: AtomicU64,
}

impl PoolManager {
    /// Start with every seat of `fragments` available. Adjacent input fragments are coalesced.
    pub fn new(fragments: Vec<Fragment>, clock: Arc<dyn Clock>) -> Self {
        let mut state = PoolState::default();
        for fragment in fragments {
            state.release(fragment);
        }

        Self {
            state: Mutex::new(state),
            clock,
            next_hold_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim exactly the requested fragments for `owner`, or nothing at all.
    ///
    /// Each requested fragment must lie inside some available fragment. Several requested
    /// fragments may come out of the same source.
    pub fn allocate(
        &self,
        requested: &[Fragment],
        owner: &str,
        hold_minutes: u32,
    ) -> BookingResult<Hold> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.sweep(now);

        let seats: u32 = requested.iter().map(Fragment::size).sum();
        if requested.is_empty() {
            return Err(BookingError::InvalidQuantity(0));
        }

        // Work out the whole change first and only then touch the map
        let mut taken: Vec<FragmentKey> = Vec::new();
        let mut leftovers: Vec<Fragment> = Vec::new();
        // held seats are cut from the pool's own fragments, so their costs are the pool's
        let mut claimed: Vec<Fragment> = Vec::with_capacity(requested.len());
        for wanted in requested {
            if let Some(index) = leftovers.iter().position(|piece| piece.contains(wanted)) {
                let source = leftovers.swap_remove(index);
                claimed.push(source.carve(wanted)?);
                leftovers.extend(source.subtract(wanted)?);
                continue;
            }

            let source = state
                .source_of(wanted)
                .filter(|key| !taken.contains(key))
                .and_then(|key| state.available.get(&key).map(|source| (key, source)));
            let Some((key, source)) = source else {
                let available = state.total_available();
                warn!(
                    "Allocation of {} seats failed: {} is not available",
                    seats, wanted
                );
                return Err(BookingError::Unavailable {
                    requested: seats,
                    available,
                });
            };
            claimed.push(source.carve(wanted)?);
            leftovers.extend(source.subtract(wanted)?);
            taken.push(key);
        }

        for key in &taken {
            state.available.remove(key);
        }
        for piece in leftovers {
            state.available.insert(key_of(&piece), piece);
        }

        let id = HoldId(self.next_hold_id.fetch_add(1, Ordering::Relaxed));
        let hold = Hold::new(id, claimed, owner, now, hold_minutes);
        state.holds.insert(id, hold.clone());

        info!(
            "Hold {} placed: {} seats for {} minutes, {} left",
            id,
            seats,
            hold_minutes,
            state.total_available()
        );
        Ok(hold)
    }

    /// Release every expired, unconfirmed hold. Returns how many were released.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        self.lock().sweep(now)
    }

    /// Turn a live hold into a reservation.
    ///
    /// Does not sweep first: a hold past its window that has not been swept yet reports `Expired`.
    pub fn confirm(&self, id: HoldId, owner: &str) -> BookingResult<Confirmation> {
        let now = self.clock.now();
        let mut state = self.lock();

        let hold = state
            .holds
            .get_mut(&id)
            .ok_or(BookingError::NotFound(id))?;
        if !hold.is_owned_by(owner) {
            return Err(BookingError::EmailMismatch(id));
        }

        let code = hold.confirm(now)?;
        info!("Hold {} confirmed ({} seats)", id, hold.seat_count());
        Ok(Confirmation {
            hold_id: id,
            code,
            confirmed_at: now,
        })
    }

    /// Look up a live hold on behalf of its owner
    pub fn hold(&self, id: HoldId, owner: &str) -> BookingResult<Hold> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.sweep(now);

        let hold = state.holds.get(&id).ok_or(BookingError::NotFound(id))?;
        if !hold.is_owned_by(owner) {
            return Err(BookingError::EmailMismatch(id));
        }
        Ok(hold.clone())
    }

    /// Every live hold, in id order
    pub fn holds(&self) -> Vec<Hold> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.sweep(now);
        state.holds.values().cloned().collect()
    }

    /// Seats that can be held right now
    pub fn total_available(&self) -> u32 {
        let now = self.clock.now();
        let mut state = self.lock();
        state.sweep(now);
        state.total_available()
    }

    /// Snapshot of the available fragments in `(block, start)` order
    pub fn available_fragments(&self) -> Vec<Fragment> {
        let now = self.clock.now();
        let mut state = self.lock();
        state.sweep(now);
        state.available.values().cloned().collect()
    }
}
