use altis_shared::{BookingRecord, BookingReference, SeatKey};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Seat {0} already has a booking")]
    DuplicateSeat(SeatKey),

    #[error("Booking reference {0} is already in use")]
    DuplicateReference(BookingReference),

    #[error("No booking for seat {0}")]
    NotFound(SeatKey),

    #[error("Ledger storage failure: {0}")]
    Storage(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Durable record of active bookings, keyed by seat and by reference.
///
/// Implementations acknowledge `insert` and `delete_by_seat` only after the
/// change is committed, and must keep both keys unique under concurrent
/// callers.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    async fn insert(&self, record: &BookingRecord) -> LedgerResult<()>;

    /// Removes and returns the record for `seat`.
    async fn delete_by_seat(&self, seat: &SeatKey) -> LedgerResult<BookingRecord>;

    async fn find_by_seat(&self, seat: &SeatKey) -> LedgerResult<Option<BookingRecord>>;

    async fn find_by_reference(
        &self,
        reference: &BookingReference,
    ) -> LedgerResult<Option<BookingRecord>>;

    /// Consistent snapshot of every active booking.
    async fn load_all(&self) -> LedgerResult<Vec<BookingRecord>>;

    async fn close(&self);
}
