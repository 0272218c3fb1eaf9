pub mod planner;
pub mod pool;
pub mod service;

pub use planner::AllocationPlanner;
pub use pool::{Confirmation, PoolManager};
pub use service::BookingService;

use boxoffice_core::{CoreError, HoldError, HoldId};
use boxoffice_store::LeaseError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Not enough seats: requested {requested}, available {available}")]
    Unavailable { requested: u32, available: u32 },

    #[error("Another booking for {0} is in flight, retry shortly")]
    LeaseBusy(String),

    #[error("Hold not found: {0}")]
    NotFound(HoldId),

    #[error("Hold {0} belongs to another customer")]
    EmailMismatch(HoldId),

    #[error("Hold {0} has expired")]
    Expired(HoldId),

    #[error("Hold {0} is already confirmed")]
    AlreadyConfirmed(HoldId),

    #[error("Invalid seat quantity: {0}")]
    InvalidQuantity(u32),

    #[error("A customer email is required")]
    InvalidOwner,

    #[error(transparent)]
    Seating(#[from] CoreError),
}

impl From<HoldError> for BookingError {
    fn from(err: HoldError) -> Self {
        match err {
            HoldError::Expired(id) => BookingError::Expired(id),
            HoldError::AlreadyConfirmed(id) => BookingError::AlreadyConfirmed(id),
        }
    }
}

impl From<LeaseError> for BookingError {
    fn from(err: LeaseError) -> Self {
        match err {
            LeaseError::Busy { key, .. } => BookingError::LeaseBusy(key),
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
