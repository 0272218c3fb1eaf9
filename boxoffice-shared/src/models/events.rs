use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A seat as it appears on the event stream.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SeatRef {
    pub block: u32,
    pub position: u32,
}

/// Changes to an event's seat pool, broadcast to stream subscribers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatEvent {
    HoldPlaced {
        event_id: String,
        hold_id: u64,
        seats: Vec<SeatRef>,
        held_at: DateTime<Utc>,
    },
    HoldConfirmed {
        event_id: String,
        hold_id: u64,
        confirmed_at: DateTime<Utc>,
    },
}

impl SeatEvent {
    pub fn event_id(&self) -> &str {
        match self {
            SeatEvent::HoldPlaced { event_id, .. } => event_id,
            SeatEvent::HoldConfirmed { event_id, .. } => event_id,
        }
    }

    /// Name used for the SSE `event:` field
    pub fn kind(&self) -> &'static str {
        match self {
            SeatEvent::HoldPlaced { .. } => "hold_placed",
            SeatEvent::HoldConfirmed { .. } => "hold_confirmed",
        }
    }
}
