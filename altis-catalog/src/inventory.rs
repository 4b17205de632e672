use std::collections::HashMap;

use altis_shared::{BookingRecord, BookingReference, SeatKey};
use serde::{Deserialize, Serialize};

use crate::layout::{CabinLayout, LayoutError};

/// Status of one cabin position. `Blocked` and `Storage` never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reference", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Free,
    Blocked,
    Storage,
    Reserved(BookingReference),
}

impl SeatStatus {
    /// Display code. Reserved seats show a fixed `R`, never their reference.
    pub fn code(&self) -> char {
        match self {
            SeatStatus::Free => 'F',
            SeatStatus::Reserved(_) => 'R',
            SeatStatus::Blocked => 'X',
            SeatStatus::Storage => 'S',
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, SeatStatus::Free)
    }

    pub fn reference(&self) -> Option<&BookingReference> {
        match self {
            SeatStatus::Reserved(reference) => Some(reference),
            _ => None,
        }
    }
}

/// One rendered cabin row, codes in layout column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatRow {
    pub row: u16,
    pub codes: Vec<char>,
}

impl SeatRow {
    pub fn codes_string(&self) -> String {
        self.codes.iter().collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeatCounts {
    pub free: usize,
    pub reserved: usize,
    pub blocked: usize,
    pub storage: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatMapError {
    #[error("Seat {0} is not part of this cabin")]
    UnknownSeat(SeatKey),

    #[error("Seat {seat} is not bookable (status {code})")]
    NotBookable { seat: SeatKey, code: char },

    #[error("Seat {0} is not reserved")]
    NotReserved(SeatKey),
}

/// Authoritative in-memory status table for one cabin.
///
/// Built from a [`CabinLayout`] and then only moved between `Free` and
/// `Reserved`. Callers are responsible for serializing access per seat.
#[derive(Debug, Clone)]
pub struct SeatMap {
    layout: CabinLayout,
    seats: HashMap<SeatKey, SeatStatus>,
}

impl SeatMap {
    pub fn new(layout: CabinLayout) -> Result<Self, LayoutError> {
        layout.validate()?;
        let seats = layout.build();
        Ok(Self { layout, seats })
    }

    /// Builds the map and marks every ledger record's seat as reserved.
    pub fn with_bookings<'a, I>(layout: CabinLayout, records: I) -> Result<Self, SeatMapRecoveryError>
    where
        I: IntoIterator<Item = &'a BookingRecord>,
    {
        let mut map = Self::new(layout)?;
        for record in records {
            map.reserve(&record.seat, record.reference.clone())?;
        }
        Ok(map)
    }

    pub fn layout(&self) -> &CabinLayout {
        &self.layout
    }

    pub fn contains(&self, seat: &SeatKey) -> bool {
        self.seats.contains_key(seat)
    }

    pub fn status(&self, seat: &SeatKey) -> Option<&SeatStatus> {
        self.seats.get(seat)
    }

    /// Unknown seats are simply not bookable.
    pub fn is_bookable(&self, seat: &SeatKey) -> bool {
        self.status(seat).is_some_and(SeatStatus::is_free)
    }

    pub fn reserve(&mut self, seat: &SeatKey, reference: BookingReference) -> Result<(), SeatMapError> {
        let status = self
            .seats
            .get_mut(seat)
            .ok_or(SeatMapError::UnknownSeat(*seat))?;

        if !status.is_free() {
            return Err(SeatMapError::NotBookable {
                seat: *seat,
                code: status.code(),
            });
        }

        *status = SeatStatus::Reserved(reference);
        Ok(())
    }

    /// Frees a reserved seat and hands back the reference it carried.
    pub fn release(&mut self, seat: &SeatKey) -> Result<BookingReference, SeatMapError> {
        let status = self
            .seats
            .get_mut(seat)
            .ok_or(SeatMapError::UnknownSeat(*seat))?;

        match std::mem::replace(status, SeatStatus::Free) {
            SeatStatus::Reserved(reference) => Ok(reference),
            other => {
                *status = other;
                Err(SeatMapError::NotReserved(*seat))
            }
        }
    }

    /// Lazily renders rows in layout order; call again to start over.
    pub fn render(&self) -> impl Iterator<Item = SeatRow> + '_ {
        (1..=self.layout.rows).map(move |row| SeatRow {
            row,
            codes: self
                .layout
                .columns
                .iter()
                .map(|&column| {
                    self.seats
                        .get(&SeatKey::new(row, column))
                        .map_or(' ', SeatStatus::code)
                })
                .collect(),
        })
    }

    pub fn counts(&self) -> SeatCounts {
        self.seats
            .values()
            .fold(SeatCounts::default(), |mut counts, status| {
                match status {
                    SeatStatus::Free => counts.free += 1,
                    SeatStatus::Reserved(_) => counts.reserved += 1,
                    SeatStatus::Blocked => counts.blocked += 1,
                    SeatStatus::Storage => counts.storage += 1,
                }
                counts
            })
    }

    pub fn reserved(&self) -> impl Iterator<Item = (&SeatKey, &BookingReference)> {
        self.seats
            .iter()
            .filter_map(|(seat, status)| status.reference().map(|reference| (seat, reference)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatMapRecoveryError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Seat(#[from] SeatMapError),
}
