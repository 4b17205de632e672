use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::seat::SeatKey;
use crate::pii::Masked;

/// Caller-facing code identifying an active reservation.
///
/// Always exactly [`BookingReference::LEN`] characters from
/// [`BookingReference::ALPHABET`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingReference(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Booking reference {0:?} must be {len} characters from A-Z and 0-9", len = BookingReference::LEN)]
pub struct ReferenceFormatError(pub String);

impl BookingReference {
    pub const LEN: usize = 8;
    pub const ALPHABET: &'static [u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    pub fn new(code: impl Into<String>) -> Result<Self, ReferenceFormatError> {
        let code = code.into();
        let well_formed = code.len() == Self::LEN
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

        if well_formed {
            Ok(Self(code))
        } else {
            Err(ReferenceFormatError(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Size of the whole code space, 36^8.
    pub fn code_space() -> u64 {
        (Self::ALPHABET.len() as u64).pow(Self::LEN as u32)
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BookingReference {
    type Err = ReferenceFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BookingReference {
    type Error = ReferenceFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BookingReference> for String {
    fn from(reference: BookingReference) -> Self {
        reference.0
    }
}

/// Passenger fields collected by the front end before a booking is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerDetails {
    pub first_name: String,
    pub last_name: String,
    pub passport_number: Masked<String>,
}

impl PassengerDetails {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        passport_number: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            passport_number: Masked::new(passport_number.into()),
        }
    }
}

/// One row of the booking ledger; exists exactly while its seat is reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub seat: SeatKey,
    pub reference: BookingReference,
    #[serde(flatten)]
    pub passenger: PassengerDetails,
    pub booked_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn new(seat: SeatKey, reference: BookingReference, passenger: PassengerDetails) -> Self {
        Self {
            seat,
            reference,
            passenger,
            booked_at: Utc::now(),
        }
    }
}
