use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use altis_catalog::{CabinLayout, SeatCounts, SeatMap, SeatRow, SeatStatus};
use altis_core::repository::{BookingLedger, LedgerError};
use altis_core::ReferenceGenerator;
use altis_shared::{BookingRecord, BookingReference, PassengerDetails, SeatEvent, SeatKey};
use altis_store::ReservationRules;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::ReservationError;
use crate::locks::SeatLocks;

/// Books and cancels seats for one cabin.
///
/// Owns the in-memory seat map and the set of active references, and writes
/// every transition through the ledger before applying it in memory. A
/// transition holds its seat's lock from validation until the seat map is
/// updated, so concurrent requests for one seat are serialized while
/// different seats proceed independently.
pub struct ReservationService {
    seat_map: RwLock<SeatMap>,
    locks: SeatLocks,
    references: Mutex<HashSet<BookingReference>>,
    generator: ReferenceGenerator,
    ledger: Arc<dyn BookingLedger>,
    events: broadcast::Sender<SeatEvent>,
}

impl ReservationService {
    /// Builds the seat map from `layout` and replays every ledger record onto it.
    ///
    /// Must complete before the service is shared with request handlers.
    pub async fn open(
        layout: CabinLayout,
        ledger: Arc<dyn BookingLedger>,
        rules: &ReservationRules,
    ) -> Result<Self, ReservationError> {
        layout
            .validate()
            .map_err(|e| ReservationError::InvalidLayout(e.to_string()))?;

        let records = ledger
            .load_all()
            .await
            .map_err(|e| ReservationError::Recovery(e.to_string()))?;

        let mut references = HashSet::with_capacity(records.len());
        for record in &records {
            if !references.insert(record.reference.clone()) {
                return Err(ReservationError::Recovery(format!(
                    "reference {} is held by more than one seat",
                    record.reference
                )));
            }
        }

        let seat_map = SeatMap::with_bookings(layout, &records)
            .map_err(|e| ReservationError::Recovery(e.to_string()))?;

        let locks = SeatLocks::new(
            seat_map.layout().seat_keys(),
            Duration::from_millis(rules.lock_timeout_ms),
        );
        let (events, _) = broadcast::channel(rules.event_buffer.max(1));

        let counts = seat_map.counts();
        info!(
            free = counts.free,
            reserved = counts.reserved,
            blocked = counts.blocked,
            storage = counts.storage,
            "Seat map restored from ledger"
        );

        Ok(Self {
            seat_map: RwLock::new(seat_map),
            locks,
            references: Mutex::new(references),
            generator: ReferenceGenerator::new(rules.reference_max_attempts),
            ledger,
            events,
        })
    }

    pub async fn check_availability(&self, seat: &str) -> bool {
        match parse_seat(seat) {
            Ok(seat) => self.seat_map.read().await.is_bookable(&seat),
            Err(_) => false,
        }
    }

    pub async fn seat_status(&self, seat: &str) -> Result<SeatStatus, ReservationError> {
        let key = parse_seat(seat)?;
        self.seat_map
            .read()
            .await
            .status(&key)
            .cloned()
            .ok_or_else(|| ReservationError::UnknownSeat(seat.to_string()))
    }

    /// Reserves a free seat for `passenger` and returns the new booking reference.
    ///
    /// On any failure the seat stays free, the ledger is unchanged and the
    /// reference is not left claimed.
    pub async fn book(
        &self,
        seat: &str,
        passenger: PassengerDetails,
    ) -> Result<BookingReference, ReservationError> {
        let seat = parse_seat(seat)?;
        let _guard = self.locks.acquire(&seat).await?;

        if !self.seat_map.read().await.is_bookable(&seat) {
            debug!(%seat, "Rejected booking for unavailable seat");
            return Err(ReservationError::SeatUnavailable(seat));
        }

        let reference = self.claim_reference().await?;
        let record = BookingRecord::new(seat, reference.clone(), passenger);

        if let Err(e) = self.ledger.insert(&record).await {
            self.release_reference(&reference).await;
            warn!(%seat, "Booking not persisted: {}", e);
            return Err(ledger_error(e));
        }

        let reserved = self.seat_map.write().await.reserve(&seat, reference.clone());
        if let Err(e) = reserved {
            error!(%seat, "Seat map rejected a persisted booking: {}", e);
            match self.ledger.delete_by_seat(&seat).await {
                Ok(_) => self.release_reference(&reference).await,
                Err(rollback) => error!(%seat, "Ledger rollback failed: {}", rollback),
            }
            return Err(ReservationError::Integrity(e.to_string()));
        }

        info!(%seat, %reference, "Seat booked");
        // No subscribers is fine.
        let _ = self.events.send(SeatEvent::reserved(seat));
        Ok(reference)
    }

    /// Frees a reserved seat and returns the booking record that was removed.
    ///
    /// On any failure the seat stays reserved and its ledger record is kept.
    pub async fn cancel(&self, seat: &str) -> Result<BookingRecord, ReservationError> {
        let seat = parse_seat(seat)?;
        let _guard = self.locks.acquire(&seat).await?;

        let held = match self.seat_map.read().await.status(&seat) {
            Some(SeatStatus::Reserved(reference)) => reference.clone(),
            Some(_) => {
                debug!(%seat, "Rejected cancellation for seat that is not reserved");
                return Err(ReservationError::NotReserved(seat));
            }
            None => return Err(ReservationError::UnknownSeat(seat.to_string())),
        };

        let record = self.ledger.delete_by_seat(&seat).await.map_err(|e| {
            warn!(%seat, "Cancellation not persisted: {}", e);
            ledger_error(e)
        })?;

        if record.reference != held {
            error!(
                %seat,
                ledger = %record.reference,
                seat_map = %held,
                "Ledger and seat map disagree on booking reference"
            );
        }

        let released = self.seat_map.write().await.release(&seat);
        if let Err(e) = released {
            error!(%seat, "Seat map rejected a persisted cancellation: {}", e);
            if let Err(restore) = self.ledger.insert(&record).await {
                error!(%seat, "Ledger restore failed: {}", restore);
            }
            return Err(ReservationError::Integrity(e.to_string()));
        }

        {
            let mut active = self.references.lock().await;
            active.remove(&record.reference);
            active.remove(&held);
        }

        info!(%seat, reference = %record.reference, "Booking cancelled");
        let _ = self.events.send(SeatEvent::released(seat));
        Ok(record)
    }

    pub async fn find_booking(&self, reference: &str) -> Result<BookingRecord, ReservationError> {
        let Ok(parsed) = BookingReference::new(reference) else {
            return Err(ReservationError::BookingNotFound(reference.to_string()));
        };

        self.ledger
            .find_by_reference(&parsed)
            .await
            .map_err(ledger_error)?
            .ok_or_else(|| ReservationError::BookingNotFound(reference.to_string()))
    }

    /// Snapshot of every row's display codes.
    pub async fn render(&self) -> Vec<SeatRow> {
        self.seat_map.read().await.render().collect()
    }

    pub async fn counts(&self) -> SeatCounts {
        self.seat_map.read().await.counts()
    }

    pub async fn active_references(&self) -> usize {
        self.references.lock().await.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatEvent> {
        self.events.subscribe()
    }

    pub async fn shutdown(&self) {
        self.ledger.close().await;
        info!("Reservation service shut down");
    }

    async fn claim_reference(&self) -> Result<BookingReference, ReservationError> {
        let mut active = self.references.lock().await;
        let reference = self.generator.generate(&active)?;
        active.insert(reference.clone());
        Ok(reference)
    }

    async fn release_reference(&self, reference: &BookingReference) {
        self.references.lock().await.remove(reference);
    }
}

fn parse_seat(seat: &str) -> Result<SeatKey, ReservationError> {
    seat.parse()
        .map_err(|_| ReservationError::UnknownSeat(seat.to_string()))
}

fn ledger_error(err: LedgerError) -> ReservationError {
    match err {
        LedgerError::Storage(msg) => ReservationError::Storage(msg),
        other => ReservationError::Integrity(other.to_string()),
    }
}
