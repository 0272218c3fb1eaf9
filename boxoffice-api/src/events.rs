use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/events", get(list_events))
        .route(
            "/v1/events/{event_id}/seats/available",
            get(seats_available),
        )
        .route("/v1/events/{event_id}/stream", get(stream_events))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub event_id: String,
    pub available: u32,
}

/// GET /v1/events
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.events())
}

/// GET /v1/events/{event_id}/seats/available
pub async fn seats_available(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    state.require_event(&event_id)?;

    Ok(Json(AvailabilityResponse {
        available: state.service.seats_available(),
        event_id,
    }))
}

/// GET /v1/events/{event_id}/stream
/// Server-sent hold events for one event
pub async fn stream_events(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    state.require_event(&event_id)?;

    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event_id = event_id.clone();
        async move {
            match result {
                Ok(event) if event.event_id() == event_id => {
                    let data = serde_json::to_string(&event).ok()?;
                    Some(Ok::<_, Infallible>(Event::default().event(event.kind()).data(data)))
                }
                Ok(_) => None,
                Err(err) => {
                    // a slow subscriber skipped some events
                    tracing::warn!("Stream subscriber lagged: {}", err);
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
