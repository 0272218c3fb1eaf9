pub mod venue;

pub use venue::{layout, SquareVenue, Venue, VenueSpec};
