use altis_core::ReferenceError;
use altis_shared::SeatKey;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationError {
    #[error("Unknown seat: {0}")]
    UnknownSeat(String),

    #[error("Seat {0} is not available")]
    SeatUnavailable(SeatKey),

    #[error("Seat {0} is not reserved")]
    NotReserved(SeatKey),

    #[error("No active booking with reference {0}")]
    BookingNotFound(String),

    #[error("Timed out waiting for seat {0}")]
    LockTimeout(SeatKey),

    #[error("Booking storage unavailable: {0}")]
    Storage(String),

    #[error("Booking integrity violation: {0}")]
    Integrity(String),

    #[error(transparent)]
    ReferenceExhausted(#[from] ReferenceError),

    #[error("Cannot restore bookings: {0}")]
    Recovery(String),

    #[error("Invalid cabin layout: {0}")]
    InvalidLayout(String),
}

impl ReservationError {
    /// Transient failures a caller may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout(_) | Self::Storage(_))
    }

    /// Failures caused by the request rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownSeat(_) | Self::SeatUnavailable(_) | Self::NotReserved(_) | Self::BookingNotFound(_)
        )
    }
}
