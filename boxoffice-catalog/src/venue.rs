use boxoffice_core::{Fragment, Seat};
use serde::{Deserialize, Serialize};

/// Anything that can describe an empty house as a list of fragments
pub trait Venue: Send + Sync {
    /// One fragment per block, every seat available
    fn fragments(&self) -> &[Fragment];

    fn capacity(&self) -> u32 {
        self.fragments().iter().map(Fragment::size).sum()
    }
}

/// Dimensions of a rectangular venue and its most desirable seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueSpec {
    pub rows: u32,
    pub seats_per_row: u32,
    pub ideal_row: u32,
    pub ideal_seat: u32,
}

impl Default for VenueSpec {
    fn default() -> Self {
        Self {
            rows: 100,
            seats_per_row: 100,
            ideal_row: 0,
            ideal_seat: 50,
        }
    }
}

/// A rectangular venue: one block per row, seat cost is the straight-line distance to the ideal seat.
#[derive(Debug, Clone)]
pub struct SquareVenue {
    spec: VenueSpec,
    fragments: Vec<Fragment>,
}

impl SquareVenue {
    pub fn new(spec: VenueSpec) -> Self {
        Self {
            fragments: layout(spec.rows, spec.seats_per_row, spec.ideal_row, spec.ideal_seat),
            spec,
        }
    }

    pub fn spec(&self) -> VenueSpec {
        self.spec
    }

    /// Cost of a single seat, `None` if it is outside the venue
    pub fn seat_cost(&self, block: u32, position: u32) -> Option<f64> {
        self.fragments
            .iter()
            .find_map(|f| f.seat_cost(block, position))
    }
}

impl Venue for SquareVenue {
    fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }
}

fn distance(row: u32, seat: u32, ideal_row: u32, ideal_seat: u32) -> f64 {
    let dr = f64::from(row) - f64::from(ideal_row);
    let ds = f64::from(seat) - f64::from(ideal_seat);
    (dr * dr + ds * ds).sqrt()
}

/// Build the initial layout: `rows` fragments of `seats_per_row` seats each, zero-based.
pub fn layout(rows: u32, seats_per_row: u32, ideal_row: u32, ideal_seat: u32) -> Vec<Fragment> {
    (0..rows)
        .filter_map(|row| {
            let seats = (0..seats_per_row)
                .map(|seat| Seat::new(row, seat, distance(row, seat, ideal_row, ideal_seat)))
                .collect();
            // only an empty row can fail validation
            Fragment::new(seats).ok()
        })
        .collect()
}
