use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boxoffice_booking::BookingError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    GoneError(String),
    #[error("{0}")]
    UnavailableError(String),
    #[error("{0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::GoneError(msg) => (StatusCode::GONE, msg),
            AppError::UnavailableError(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidQuantity(_) | BookingError::InvalidOwner => {
                AppError::ValidationError(err.to_string())
            }
            // Same answer for a stranger's hold as for a missing one
            BookingError::NotFound(id) | BookingError::EmailMismatch(id) => {
                AppError::NotFoundError(BookingError::NotFound(id).to_string())
            }
            BookingError::Unavailable { .. } | BookingError::AlreadyConfirmed(_) => {
                AppError::ConflictError(err.to_string())
            }
            BookingError::Expired(_) => AppError::GoneError(err.to_string()),
            BookingError::LeaseBusy(_) => AppError::UnavailableError(err.to_string()),
            BookingError::Seating(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}
