pub mod events;

pub use events::{SeatEvent, SeatRef};
