use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use altis_core::repository::{BookingLedger, LedgerError, LedgerResult};
use altis_shared::{BookingRecord, BookingReference, SeatKey};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Volatile ledger for tests, demos and the `memory` backend.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
    closed: AtomicBool,
}

#[derive(Default)]
struct LedgerState {
    by_seat: HashMap<SeatKey, BookingRecord>,
    by_reference: HashMap<BookingReference, SeatKey>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Starts from existing records, as if they had been inserted one by one.
    pub fn with_records(records: impl IntoIterator<Item = BookingRecord>) -> Self {
        let mut state = LedgerState::default();
        for record in records {
            state.by_reference.insert(record.reference.clone(), record.seat);
            state.by_seat.insert(record.seat, record);
        }
        Self {
            inner: RwLock::new(state),
            closed: AtomicBool::new(false),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.by_seat.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> LedgerResult<()> {
        if self.is_closed() {
            return Err(LedgerError::Storage("ledger is closed".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingLedger for InMemoryLedger {
    async fn insert(&self, record: &BookingRecord) -> LedgerResult<()> {
        self.ensure_open()?;
        let mut state = self.inner.write().await;

        if state.by_seat.contains_key(&record.seat) {
            return Err(LedgerError::DuplicateSeat(record.seat));
        }
        if state.by_reference.contains_key(&record.reference) {
            return Err(LedgerError::DuplicateReference(record.reference.clone()));
        }

        state.by_reference.insert(record.reference.clone(), record.seat);
        state.by_seat.insert(record.seat, record.clone());
        Ok(())
    }

    async fn delete_by_seat(&self, seat: &SeatKey) -> LedgerResult<BookingRecord> {
        self.ensure_open()?;
        let mut state = self.inner.write().await;

        let record = state.by_seat.remove(seat).ok_or(LedgerError::NotFound(*seat))?;
        state.by_reference.remove(&record.reference);
        Ok(record)
    }

    async fn find_by_seat(&self, seat: &SeatKey) -> LedgerResult<Option<BookingRecord>> {
        self.ensure_open()?;
        Ok(self.inner.read().await.by_seat.get(seat).cloned())
    }

    async fn find_by_reference(&self, reference: &BookingReference) -> LedgerResult<Option<BookingRecord>> {
        self.ensure_open()?;
        let state = self.inner.read().await;
        Ok(state
            .by_reference
            .get(reference)
            .and_then(|seat| state.by_seat.get(seat))
            .cloned())
    }

    async fn load_all(&self) -> LedgerResult<Vec<BookingRecord>> {
        self.ensure_open()?;
        let state = self.inner.read().await;
        let mut records: Vec<BookingRecord> = state.by_seat.values().cloned().collect();
        records.sort_by_key(|record| record.seat);
        Ok(records)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
