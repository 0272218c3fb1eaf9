use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use boxoffice_core::{Hold, HoldId, HoldStatus, Seat};
use boxoffice_shared::models::{SeatEvent, SeatRef};
use boxoffice_shared::pii::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/events/{event_id}/holds",
            post(create_hold).get(list_holds),
        )
        .route("/v1/events/{event_id}/holds/{hold_id}", get(get_hold))
        .route(
            "/v1/events/{event_id}/holds/{hold_id}/confirm",
            post(confirm_hold),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateHoldRequest {
    pub num_seats: u32,
    pub email: Masked<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub email: Masked<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmHoldRequest {
    pub email: Masked<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeatResponse {
    pub block: u32,
    pub position: u32,
    pub cost: f64,
}

impl From<&Seat> for SeatResponse {
    fn from(seat: &Seat) -> Self {
        Self {
            block: seat.block,
            position: seat.position,
            cost: seat.cost,
        }
    }
}

/// A hold as its owner sees it
#[derive(Debug, Serialize, Deserialize)]
pub struct HoldResponse {
    pub hold_id: HoldId,
    pub event_id: String,
    pub email: Masked<String>,
    pub status: HoldStatus,
    pub num_seats: u32,
    pub total_cost: f64,
    pub seats: Vec<SeatResponse>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub confirmation_code: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl HoldResponse {
    fn new(event_id: &str, hold: &Hold) -> Self {
        Self {
            hold_id: hold.id(),
            event_id: event_id.to_string(),
            email: hold.owner_email().clone(),
            status: hold.status(),
            num_seats: hold.seat_count(),
            total_cost: hold.total_cost(),
            seats: hold.seats().map(SeatResponse::from).collect(),
            created_at: hold.created_at(),
            // reservations do not expire
            expires_at: (!hold.is_confirmed()).then(|| hold.expires_at()),
            confirmation_code: hold.confirmation_code().map(str::to_string),
            confirmed_at: hold.confirmed_at(),
        }
    }
}

/// Listing entry; leaves out the owner and the confirmation code
#[derive(Debug, Serialize, Deserialize)]
pub struct HoldSummary {
    pub hold_id: HoldId,
    pub status: HoldStatus,
    pub num_seats: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmHoldResponse {
    pub hold_id: HoldId,
    pub confirmation_code: String,
    pub confirmed_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/events/{event_id}/holds
/// Find and hold the best available seats
pub async fn create_hold(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<(StatusCode, Json<HoldResponse>), AppError> {
    state.require_event(&event_id)?;

    let hold = state.service.hold_seats(req.num_seats, req.email.inner())?;

    state.publish(SeatEvent::HoldPlaced {
        event_id: event_id.clone(),
        hold_id: hold.id().0,
        seats: hold
            .seats()
            .map(|s| SeatRef {
                block: s.block,
                position: s.position,
            })
            .collect(),
        held_at: hold.created_at(),
    });

    Ok((StatusCode::CREATED, Json(HoldResponse::new(&event_id, &hold))))
}

/// GET /v1/events/{event_id}/holds
pub async fn list_holds(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<HoldSummary>>, AppError> {
    state.require_event(&event_id)?;

    let holds = state
        .service
        .holds()
        .iter()
        .map(|hold| HoldSummary {
            hold_id: hold.id(),
            status: hold.status(),
            num_seats: hold.seat_count(),
            created_at: hold.created_at(),
        })
        .collect();

    Ok(Json(holds))
}

/// GET /v1/events/{event_id}/holds/{hold_id}?email=
pub async fn get_hold(
    State(state): State<AppState>,
    Path((event_id, hold_id)): Path<(String, u64)>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<HoldResponse>, AppError> {
    state.require_event(&event_id)?;

    let hold = state.service.hold(HoldId(hold_id), owner.email.inner())?;
    Ok(Json(HoldResponse::new(&event_id, &hold)))
}

/// POST /v1/events/{event_id}/holds/{hold_id}/confirm
/// Turn a live hold into a reservation
pub async fn confirm_hold(
    State(state): State<AppState>,
    Path((event_id, hold_id)): Path<(String, u64)>,
    Json(req): Json<ConfirmHoldRequest>,
) -> Result<Json<ConfirmHoldResponse>, AppError> {
    state.require_event(&event_id)?;

    let hold_id = HoldId(hold_id);
    let confirmation = state.service.confirm(hold_id, req.email.inner())?;

    state.publish(SeatEvent::HoldConfirmed {
        event_id,
        hold_id: hold_id.0,
        confirmed_at: confirmation.confirmed_at,
    });

    Ok(Json(ConfirmHoldResponse {
        hold_id: confirmation.hold_id,
        confirmation_code: confirmation.code,
        confirmed_at: confirmation.confirmed_at,
    }))
}
