use altis_catalog::{SeatCounts, SeatRow, SeatStatus};
use altis_shared::{BookingReference, PassengerDetails};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub rows: Vec<RowResponse>,
    pub counts: SeatCounts,
}

#[derive(Debug, Serialize)]
pub struct RowResponse {
    pub row: u16,
    /// One status code per column: F free, R reserved, X blocked, S storage.
    pub seats: String,
}

#[derive(Debug, Serialize)]
pub struct SeatResponse {
    pub seat: String,
    pub available: bool,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub seat: String,
    pub reference: BookingReference,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/seats", get(list_seats))
        .route("/v1/seats/display", get(display_seats))
        .route("/v1/seats/{seat}", get(get_seat))
        .route("/v1/seats/{seat}/booking", post(book_seat).delete(cancel_seat))
}

async fn list_seats(State(state): State<AppState>) -> Json<SeatMapResponse> {
    let rows = state
        .reservations
        .render()
        .await
        .into_iter()
        .map(|row| RowResponse {
            row: row.row,
            seats: row.codes_string(),
        })
        .collect();
    let counts = state.reservations.counts().await;

    Json(SeatMapResponse { rows, counts })
}

/// Plain-text seat chart, one `Row N:  F F F X F F F` line per row.
async fn display_seats(State(state): State<AppState>) -> String {
    render_text(&state.reservations.render().await)
}

async fn get_seat(
    State(state): State<AppState>,
    Path(seat): Path<String>,
) -> Result<Json<SeatResponse>, AppError> {
    let status = state.reservations.seat_status(&seat).await?;

    Ok(Json(SeatResponse {
        available: status.is_free(),
        status: status_label(&status),
        seat,
    }))
}

async fn book_seat(
    State(state): State<AppState>,
    Path(seat): Path<String>,
    Json(passenger): Json<PassengerDetails>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let reference = state.reservations.book(&seat, passenger).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse { seat, reference })))
}

async fn cancel_seat(
    State(state): State<AppState>,
    Path(seat): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let record = state.reservations.cancel(&seat).await?;
    Ok(Json(BookingResponse {
        seat,
        reference: record.reference,
    }))
}

pub fn render_text(rows: &[SeatRow]) -> String {
    rows.iter()
        .map(|row| {
            let codes: Vec<String> = row.codes.iter().map(char::to_string).collect();
            format!("Row {}:  {}\n", row.row, codes.join(" "))
        })
        .collect()
}

fn status_label(status: &SeatStatus) -> &'static str {
    match status {
        SeatStatus::Free => "FREE",
        SeatStatus::Reserved(_) => "RESERVED",
        SeatStatus::Blocked => "BLOCKED",
        SeatStatus::Storage => "STORAGE",
    }
}
