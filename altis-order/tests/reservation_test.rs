use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use altis_catalog::{CabinLayout, SeatStatus};
use altis_core::repository::{BookingLedger, LedgerError, LedgerResult};
use altis_order::{ReservationError, ReservationService};
use altis_shared::{BookingRecord, BookingReference, PassengerDetails, SeatEventKind, SeatKey};
use altis_store::{InMemoryLedger, ReservationRules};
use async_trait::async_trait;

fn passenger() -> PassengerDetails {
    PassengerDetails::new("Ada", "Lovelace", "P1234567")
}

fn key(s: &str) -> SeatKey {
    s.parse().unwrap()
}

async fn open_service(ledger: Arc<InMemoryLedger>) -> ReservationService {
    ReservationService::open(CabinLayout::standard(), ledger, &ReservationRules::default())
        .await
        .unwrap()
}

/// Wraps an in-memory ledger and fails writes on demand.
struct FlakyLedger {
    inner: InMemoryLedger,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyLedger {
    fn new() -> Self {
        Self {
            inner: InMemoryLedger::new(),
            fail_inserts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl BookingLedger for FlakyLedger {
    async fn insert(&self, record: &BookingRecord) -> LedgerResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage("disk full".into()));
        }
        self.inner.insert(record).await
    }

    async fn delete_by_seat(&self, seat: &SeatKey) -> LedgerResult<BookingRecord> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(LedgerError::Storage("connection reset".into()));
        }
        self.inner.delete_by_seat(seat).await
    }

    async fn find_by_seat(&self, seat: &SeatKey) -> LedgerResult<Option<BookingRecord>> {
        self.inner.find_by_seat(seat).await
    }

    async fn find_by_reference(&self, reference: &BookingReference) -> LedgerResult<Option<BookingRecord>> {
        self.inner.find_by_reference(reference).await
    }

    async fn load_all(&self) -> LedgerResult<Vec<BookingRecord>> {
        self.inner.load_all().await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

#[tokio::test]
async fn test_fresh_cabin_has_only_fixed_statuses() {
    let service = open_service(Arc::new(InMemoryLedger::new())).await;
    let layout = CabinLayout::standard();

    for seat in layout.seat_keys() {
        let status = service.seat_status(&seat.to_string()).await.unwrap();
        assert!(
            matches!(status, SeatStatus::Free | SeatStatus::Blocked | SeatStatus::Storage),
            "seat {} starts as {:?}",
            seat,
            status
        );
    }

    let counts = service.counts().await;
    assert_eq!(counts.reserved, 0);
    assert_eq!(counts.free + counts.blocked + counts.storage, layout.seat_count());
}

#[tokio::test]
async fn test_standard_cabin_scenario() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = open_service(ledger.clone()).await;

    assert!(!service.check_availability("77D").await);
    assert!(service.check_availability("1A").await);

    let reference = service.book("1A", passenger()).await.unwrap();
    assert_eq!(reference.as_str().len(), 8);
    assert!(reference
        .as_str()
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    assert!(!service.check_availability("1A").await);
    assert_eq!(
        service.seat_status("1A").await.unwrap(),
        SeatStatus::Reserved(reference.clone())
    );

    let stored = ledger.find_by_seat(&key("1A")).await.unwrap().unwrap();
    assert_eq!(stored.reference, reference);
    assert_eq!(stored.passenger, passenger());

    let cancelled = service.cancel("1A").await.unwrap();
    assert_eq!(cancelled.reference, reference);
    assert!(service.check_availability("1A").await);
    assert_eq!(ledger.find_by_seat(&key("1A")).await.unwrap(), None);
    assert!(ledger.is_empty().await);
    assert_eq!(service.active_references().await, 0);
}

#[tokio::test]
async fn test_aisle_and_storage_seats_cannot_be_booked() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = open_service(ledger.clone()).await;

    assert_eq!(
        service.book("1X", passenger()).await,
        Err(ReservationError::SeatUnavailable(key("1X")))
    );
    assert_eq!(
        service.book("78F", passenger()).await,
        Err(ReservationError::SeatUnavailable(key("78F")))
    );
    assert!(ledger.is_empty().await);
    assert_eq!(service.seat_status("1X").await.unwrap(), SeatStatus::Blocked);
    assert_eq!(service.seat_status("78F").await.unwrap(), SeatStatus::Storage);
}

#[tokio::test]
async fn test_unknown_seats_are_reported_as_such() {
    let service = open_service(Arc::new(InMemoryLedger::new())).await;

    for seat in ["81A", "1G", "A1", "", "1a"] {
        assert!(!service.check_availability(seat).await);
        assert_eq!(
            service.book(seat, passenger()).await,
            Err(ReservationError::UnknownSeat(seat.to_string()))
        );
        assert_eq!(
            service.cancel(seat).await,
            Err(ReservationError::UnknownSeat(seat.to_string()))
        );
    }
}

#[tokio::test]
async fn test_double_booking_is_rejected() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = open_service(ledger.clone()).await;

    let first = service.book("12C", passenger()).await.unwrap();
    assert_eq!(
        service.book("12C", PassengerDetails::new("Grace", "Hopper", "P7654321")).await,
        Err(ReservationError::SeatUnavailable(key("12C")))
    );

    let stored = ledger.find_by_seat(&key("12C")).await.unwrap().unwrap();
    assert_eq!(stored.reference, first);
    assert_eq!(stored.passenger.first_name, "Ada");
}

#[tokio::test]
async fn test_cancel_twice_fails_without_side_effects() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = open_service(ledger.clone()).await;

    service.book("5B", passenger()).await.unwrap();
    service.book("6B", passenger()).await.unwrap();
    service.cancel("5B").await.unwrap();

    for _ in 0..2 {
        assert_eq!(
            service.cancel("5B").await,
            Err(ReservationError::NotReserved(key("5B")))
        );
    }

    assert_eq!(ledger.len().await, 1);
    assert!(service.check_availability("5B").await);
    assert!(!service.check_availability("6B").await);
    assert_eq!(service.active_references().await, 1);
}

#[tokio::test]
async fn test_cancel_of_fixed_seats_is_not_reserved() {
    let service = open_service(Arc::new(InMemoryLedger::new())).await;

    assert_eq!(service.cancel("3X").await, Err(ReservationError::NotReserved(key("3X"))));
    assert_eq!(service.cancel("77E").await, Err(ReservationError::NotReserved(key("77E"))));
    assert_eq!(service.seat_status("77E").await.unwrap(), SeatStatus::Storage);
}

#[tokio::test]
async fn test_references_are_unique_across_bookings() {
    let service = open_service(Arc::new(InMemoryLedger::new())).await;
    let mut seen = std::collections::HashSet::new();

    for row in 1..=40 {
        for column in ['A', 'B', 'C', 'D', 'E', 'F'] {
            let reference = service
                .book(&format!("{}{}", row, column), passenger())
                .await
                .unwrap();
            assert!(seen.insert(reference));
        }
    }

    assert_eq!(seen.len(), 240);
    assert_eq!(service.active_references().await, 240);
}

#[tokio::test]
async fn test_find_booking_by_reference() {
    let service = open_service(Arc::new(InMemoryLedger::new())).await;
    let reference = service.book("9D", passenger()).await.unwrap();

    let record = service.find_booking(reference.as_str()).await.unwrap();
    assert_eq!(record.seat, key("9D"));

    assert_eq!(
        service.find_booking("ZZZZZZZZ").await,
        Err(ReservationError::BookingNotFound("ZZZZZZZZ".into()))
    );
    assert_eq!(
        service.find_booking("nope").await,
        Err(ReservationError::BookingNotFound("nope".into()))
    );

    service.cancel("9D").await.unwrap();
    assert!(matches!(
        service.find_booking(reference.as_str()).await,
        Err(ReservationError::BookingNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_simultaneous_bookings_for_one_seat() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = Arc::new(open_service(ledger.clone()).await);

    let first = tokio::spawn({
        let service = service.clone();
        async move { service.book("20A", passenger()).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.book("20A", PassengerDetails::new("Grace", "Hopper", "P2")).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ReservationError::SeatUnavailable(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(ledger.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_many_concurrent_bookings_for_last_seat() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = Arc::new(open_service(ledger.clone()).await);

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .book("30F", PassengerDetails::new("Pax", format!("No{}", i), format!("P{}", i)))
                    .await
            })
        })
        .collect();

    let mut successes = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(reference) => successes.push(reference),
            Err(ReservationError::SeatUnavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes.len(), 1);
    let stored = ledger.find_by_seat(&key("30F")).await.unwrap().unwrap();
    assert_eq!(stored.reference, successes[0]);
    assert_eq!(service.active_references().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_on_different_seats() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = Arc::new(open_service(ledger.clone()).await);

    let handles: Vec<_> = (1..=60)
        .map(|row| {
            let service = service.clone();
            tokio::spawn(async move { service.book(&format!("{}B", row), passenger()).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.len().await, 60);
    assert_eq!(service.counts().await.reserved, 60);
}

#[tokio::test]
async fn test_failed_insert_leaves_seat_free() {
    let ledger = Arc::new(FlakyLedger::new());
    let service = ReservationService::open(
        CabinLayout::standard(),
        ledger.clone(),
        &ReservationRules::default(),
    )
    .await
    .unwrap();

    ledger.fail_inserts.store(true, Ordering::SeqCst);
    let result = service.book("4A", passenger()).await;

    assert_eq!(result, Err(ReservationError::Storage("disk full".into())));
    assert!(result.unwrap_err().is_retryable());
    assert!(service.check_availability("4A").await);
    assert!(ledger.inner.is_empty().await);
    assert_eq!(service.active_references().await, 0);

    ledger.fail_inserts.store(false, Ordering::SeqCst);
    assert!(service.book("4A", passenger()).await.is_ok());
}

#[tokio::test]
async fn test_failed_delete_leaves_seat_reserved() {
    let ledger = Arc::new(FlakyLedger::new());
    let service = ReservationService::open(
        CabinLayout::standard(),
        ledger.clone(),
        &ReservationRules::default(),
    )
    .await
    .unwrap();

    let reference = service.book("4A", passenger()).await.unwrap();

    ledger.fail_deletes.store(true, Ordering::SeqCst);
    assert!(matches!(
        service.cancel("4A").await,
        Err(ReservationError::Storage(_))
    ));
    assert_eq!(
        service.seat_status("4A").await.unwrap(),
        SeatStatus::Reserved(reference.clone())
    );
    assert_eq!(ledger.inner.len().await, 1);
    assert_eq!(service.active_references().await, 1);

    ledger.fail_deletes.store(false, Ordering::SeqCst);
    assert_eq!(service.cancel("4A").await.unwrap().reference, reference);
}

#[tokio::test]
async fn test_reopen_restores_reservations_from_ledger() {
    let ledger = Arc::new(InMemoryLedger::new());

    let (kept, freed) = {
        let service = open_service(ledger.clone()).await;
        let kept = service.book("15E", passenger()).await.unwrap();
        let freed = service.book("16E", passenger()).await.unwrap();
        service.cancel("16E").await.unwrap();
        (kept, freed)
    };

    let restarted = open_service(ledger.clone()).await;
    assert_eq!(
        restarted.seat_status("15E").await.unwrap(),
        SeatStatus::Reserved(kept)
    );
    assert!(restarted.check_availability("16E").await);
    assert_eq!(restarted.active_references().await, 1);
    assert!(matches!(
        restarted.find_booking(freed.as_str()).await,
        Err(ReservationError::BookingNotFound(_))
    ));
    assert_eq!(
        restarted.book("15E", passenger()).await,
        Err(ReservationError::SeatUnavailable(key("15E")))
    );
}

#[tokio::test]
async fn test_open_rejects_records_on_unbookable_seats() {
    let on_storage = BookingRecord::new(
        key("77D"),
        BookingReference::new("AB12CD34").unwrap(),
        passenger(),
    );
    let ledger = Arc::new(InMemoryLedger::with_records([on_storage]));

    let result =
        ReservationService::open(CabinLayout::standard(), ledger, &ReservationRules::default()).await;
    assert!(matches!(result, Err(ReservationError::Recovery(_))));
}

#[tokio::test]
async fn test_open_rejects_invalid_layout() {
    let mut layout = CabinLayout::standard();
    layout.rows = 0;

    let result =
        ReservationService::open(layout, Arc::new(InMemoryLedger::new()), &ReservationRules::default())
            .await;
    assert!(matches!(result, Err(ReservationError::InvalidLayout(_))));
}

#[tokio::test]
async fn test_events_follow_committed_transitions() {
    let service = open_service(Arc::new(InMemoryLedger::new())).await;
    let mut events = service.subscribe();

    service.book("2A", passenger()).await.unwrap();
    let _ = service.book("2X", passenger()).await;
    service.cancel("2A").await.unwrap();

    let reserved = events.recv().await.unwrap();
    assert_eq!((reserved.seat, reserved.kind), (key("2A"), SeatEventKind::Reserved));

    let released = events.recv().await.unwrap();
    assert_eq!((released.seat, released.kind), (key("2A"), SeatEventKind::Released));

    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_render_reflects_bookings() {
    let service = open_service(Arc::new(InMemoryLedger::new())).await;
    service.book("1C", passenger()).await.unwrap();

    let rows = service.render().await;
    assert_eq!(rows.len(), 80);
    assert_eq!(rows[0].codes_string(), "FFRXFFF");
    assert_eq!(rows[76].codes_string(), "FFFXSSS");
    assert_eq!(rows[79].codes_string(), "FFFXFFF");
}

#[tokio::test]
async fn test_shutdown_closes_ledger() {
    let ledger = Arc::new(InMemoryLedger::new());
    let service = open_service(ledger.clone()).await;
    service.book("1A", passenger()).await.unwrap();

    service.shutdown().await;
    assert!(ledger.is_closed());
}
