use altis_order::ReservationError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    NotFoundError(String),
    ConflictError(String),
    /// Transient; the client may retry the same request.
    ServiceUnavailable(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                let body = Json(json!({ "error": msg, "retryable": true }));
                return (StatusCode::SERVICE_UNAVAILABLE, [(header::RETRY_AFTER, "1")], body)
                    .into_response();
            }
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

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        let message = err.to_string();
        match err {
            ReservationError::UnknownSeat(_) | ReservationError::BookingNotFound(_) => {
                AppError::NotFoundError(message)
            }
            ReservationError::SeatUnavailable(_) | ReservationError::NotReserved(_) => {
                AppError::ConflictError(message)
            }
            ReservationError::LockTimeout(_) | ReservationError::Storage(_) => {
                AppError::ServiceUnavailable(message)
            }
            ReservationError::Integrity(_)
            | ReservationError::ReferenceExhausted(_)
            | ReservationError::Recovery(_)
            | ReservationError::InvalidLayout(_) => AppError::InternalServerError(message),
        }
    }
}
