use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Booking lookup result. The passport number is never returned.
#[derive(Debug, Serialize)]
pub struct BookingSummary {
    pub reference: String,
    pub seat: String,
    pub first_name: String,
    pub last_name: String,
    pub booked_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/{reference}", get(get_booking))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<BookingSummary>, AppError> {
    let record = state.reservations.find_booking(&reference).await?;
    debug!(seat = %record.seat, "Booking lookup");

    Ok(Json(BookingSummary {
        reference: record.reference.to_string(),
        seat: record.seat.to_string(),
        first_name: record.passenger.first_name,
        last_name: record.passenger.last_name,
        booked_at: record.booked_at,
    }))
}
