use chrono::Utc;

use super::seat::SeatKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatEventKind {
    Reserved,
    Released,
}

/// Published after a seat transition has been committed to the ledger.
/// Carries no reference or passenger data.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SeatEvent {
    pub seat: SeatKey,
    pub kind: SeatEventKind,
    pub at: i64,
}

impl SeatEvent {
    pub fn reserved(seat: SeatKey) -> Self {
        Self { seat, kind: SeatEventKind::Reserved, at: Utc::now().timestamp() }
    }

    pub fn released(seat: SeatKey) -> Self {
        Self { seat, kind: SeatEventKind::Released, at: Utc::now().timestamp() }
    }
}
