use altis_core::repository::{BookingLedger, LedgerError, LedgerResult};
use altis_shared::{BookingRecord, BookingReference, Masked, PassengerDetails, SeatKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info};

const SEAT_CONSTRAINT: &str = "bookings_pkey";
const REFERENCE_CONSTRAINT: &str = "bookings_reference_key";

const SELECT_COLUMNS: &str =
    "seat_key, reference, first_name, last_name, passport_number, booked_at";

/// Booking ledger on the `bookings` table.
///
/// Every call is a single auto-committed statement, so a successful return
/// means the row change is durable.
pub struct PgBookingLedger {
    pool: PgPool,
}

impl PgBookingLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    seat_key: String,
    reference: String,
    first_name: String,
    last_name: String,
    passport_number: String,
    booked_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for BookingRecord {
    type Error = LedgerError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let seat: SeatKey = row
            .seat_key
            .parse()
            .map_err(|e| LedgerError::Storage(format!("corrupt seat_key {:?}: {}", row.seat_key, e)))?;
        let reference = BookingReference::new(row.reference)
            .map_err(|e| LedgerError::Storage(format!("corrupt reference for seat {}: {}", seat, e)))?;

        Ok(BookingRecord {
            seat,
            reference,
            passenger: PassengerDetails {
                first_name: row.first_name,
                last_name: row.last_name,
                passport_number: Masked::new(row.passport_number),
            },
            booked_at: row.booked_at,
        })
    }
}

fn storage_error(err: sqlx::Error) -> LedgerError {
    error!("Booking ledger query failed: {}", err);
    LedgerError::Storage(err.to_string())
}

/// Maps a unique violation on `constraint` to the matching duplicate error.
fn duplicate_for_constraint(constraint: Option<&str>, record: &BookingRecord) -> LedgerError {
    match constraint {
        Some(REFERENCE_CONSTRAINT) => LedgerError::DuplicateReference(record.reference.clone()),
        Some(SEAT_CONSTRAINT) | None => LedgerError::DuplicateSeat(record.seat),
        Some(other) => LedgerError::Storage(format!("unexpected unique constraint {}", other)),
    }
}

fn insert_error(err: sqlx::Error, record: &BookingRecord) -> LedgerError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return duplicate_for_constraint(db_err.constraint(), record);
        }
    }
    storage_error(err)
}

#[async_trait]
impl BookingLedger for PgBookingLedger {
    async fn insert(&self, record: &BookingRecord) -> LedgerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (seat_key, reference, first_name, last_name, passport_number, booked_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.seat.to_string())
        .bind(record.reference.as_str())
        .bind(&record.passenger.first_name)
        .bind(&record.passenger.last_name)
        .bind(record.passenger.passport_number.expose())
        .bind(record.booked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(e, record))?;

        Ok(())
    }

    async fn delete_by_seat(&self, seat: &SeatKey) -> LedgerResult<BookingRecord> {
        let sql = format!("DELETE FROM bookings WHERE seat_key = $1 RETURNING {}", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(seat.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.ok_or(LedgerError::NotFound(*seat))?.try_into()
    }

    async fn find_by_seat(&self, seat: &SeatKey) -> LedgerResult<Option<BookingRecord>> {
        let sql = format!("SELECT {} FROM bookings WHERE seat_key = $1", SELECT_COLUMNS);
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(seat.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .map(BookingRecord::try_from)
            .transpose()
    }

    async fn find_by_reference(&self, reference: &BookingReference) -> LedgerResult<Option<BookingRecord>> {
        let sql = format!("SELECT {} FROM bookings WHERE reference = $1", SELECT_COLUMNS);
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(reference.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .map(BookingRecord::try_from)
            .transpose()
    }

    async fn load_all(&self) -> LedgerResult<Vec<BookingRecord>> {
        // One statement, one snapshot.
        let sql = format!("SELECT {} FROM bookings ORDER BY seat_key", SELECT_COLUMNS);
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        info!("Loaded {} active bookings from ledger", rows.len());
        rows.into_iter().map(BookingRecord::try_from).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Booking ledger connection pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BookingRecord {
        BookingRecord::new(
            "1A".parse().unwrap(),
            BookingReference::new("AB12CD34").unwrap(),
            PassengerDetails::new("Ada", "Lovelace", "P1234567"),
        )
    }

    #[test]
    fn test_constraint_classification() {
        let record = record();

        assert_eq!(
            duplicate_for_constraint(Some("bookings_pkey"), &record),
            LedgerError::DuplicateSeat(record.seat)
        );
        assert_eq!(
            duplicate_for_constraint(Some("bookings_reference_key"), &record),
            LedgerError::DuplicateReference(record.reference.clone())
        );
        assert!(matches!(
            duplicate_for_constraint(Some("something_else"), &record),
            LedgerError::Storage(_)
        ));
    }

    #[test]
    fn test_row_conversion() {
        let row = BookingRow {
            seat_key: "12C".into(),
            reference: "ZX90QW12".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            passport_number: "P7654321".into(),
            booked_at: Utc::now(),
        };

        let record = BookingRecord::try_from(row).unwrap();
        assert_eq!(record.seat.to_string(), "12C");
        assert_eq!(record.reference.as_str(), "ZX90QW12");
        assert_eq!(record.passenger.passport_number.expose(), "P7654321");
    }

    #[test]
    fn test_corrupt_row_is_a_storage_error() {
        let row = BookingRow {
            seat_key: "12C".into(),
            reference: "bad".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            passport_number: "P7654321".into(),
            booked_at: Utc::now(),
        };

        assert!(matches!(BookingRecord::try_from(row), Err(LedgerError::Storage(_))));
    }
}
