use boxoffice_booking::BookingService;
use boxoffice_shared::models::SeatEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BookingService>,
    pub events_tx: broadcast::Sender<SeatEvent>,
}

impl AppState {
    pub fn new(service: Arc<BookingService>) -> Self {
        let (events_tx, _) = broadcast::channel(100);
        Self { service, events_tx }
    }

    /// Fail with 404 unless `event_id` is the event this instance sells
    pub fn require_event(&self, event_id: &str) -> Result<(), crate::error::AppError> {
        if self.service.event_id() == event_id {
            Ok(())
        } else {
            Err(crate::error::AppError::NotFoundError(format!(
                "Event not found: {}",
                event_id
            )))
        }
    }

    /// Publish to stream subscribers. Nobody listening is fine.
    pub fn publish(&self, event: SeatEvent) {
        if self.events_tx.send(event).is_err() {
            tracing::debug!("No stream subscribers");
        }
    }
}
