use std::collections::{BTreeSet, HashMap, HashSet};

use altis_shared::SeatKey;
use serde::{Deserialize, Serialize};

use crate::inventory::SeatStatus;

/// Static description of one cabin. Fully determines every seat's initial status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CabinLayout {
    pub rows: u16,
    /// Column symbols in display order, aisle included.
    pub columns: Vec<char>,
    pub aisle: char,
    #[serde(default)]
    pub storage_seats: BTreeSet<SeatKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Cabin must have at least one row")]
    NoRows,

    #[error("Cabin must have at least one column")]
    NoColumns,

    #[error("Column {0:?} appears more than once")]
    DuplicateColumn(char),

    #[error("Column {0:?} cannot be a digit or whitespace")]
    InvalidColumn(char),

    #[error("Aisle symbol {0:?} is not one of the cabin columns")]
    AisleNotInColumns(char),

    #[error("Storage seat {0} is outside the cabin")]
    StorageOutsideCabin(SeatKey),

    #[error("Storage seat {0} is on the aisle")]
    StorageOnAisle(SeatKey),
}

impl CabinLayout {
    /// Single-aisle 80-row cabin with six storage positions in rows 77-78.
    pub fn standard() -> Self {
        let storage_seats = ["77D", "78D", "77E", "78E", "77F", "78F"]
            .iter()
            .filter_map(|key| key.parse::<SeatKey>().ok())
            .collect();

        Self {
            rows: 80,
            columns: vec!['A', 'B', 'C', 'X', 'D', 'E', 'F'],
            aisle: 'X',
            storage_seats,
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.rows == 0 {
            return Err(LayoutError::NoRows);
        }
        if self.columns.is_empty() {
            return Err(LayoutError::NoColumns);
        }

        let mut seen = HashSet::new();
        for &column in &self.columns {
            if column.is_ascii_digit() || column.is_whitespace() {
                return Err(LayoutError::InvalidColumn(column));
            }
            if !seen.insert(column) {
                return Err(LayoutError::DuplicateColumn(column));
            }
        }

        if !seen.contains(&self.aisle) {
            return Err(LayoutError::AisleNotInColumns(self.aisle));
        }

        for seat in &self.storage_seats {
            if !self.contains(seat) {
                return Err(LayoutError::StorageOutsideCabin(*seat));
            }
            if seat.column() == self.aisle {
                return Err(LayoutError::StorageOnAisle(*seat));
            }
        }

        Ok(())
    }

    pub fn contains(&self, seat: &SeatKey) -> bool {
        (1..=self.rows).contains(&seat.row()) && self.columns.contains(&seat.column())
    }

    /// Every seat key, row-major in display column order.
    pub fn seat_keys(&self) -> impl Iterator<Item = SeatKey> + '_ {
        (1..=self.rows).flat_map(move |row| {
            self.columns.iter().map(move |&column| SeatKey::new(row, column))
        })
    }

    pub fn seat_count(&self) -> usize {
        usize::from(self.rows) * self.columns.len()
    }

    /// Initial status of a seat that exists in this layout.
    pub fn initial_status(&self, seat: &SeatKey) -> SeatStatus {
        if self.storage_seats.contains(seat) {
            SeatStatus::Storage
        } else if seat.column() == self.aisle {
            SeatStatus::Blocked
        } else {
            SeatStatus::Free
        }
    }

    /// One entry per row x column, nothing else.
    pub fn build(&self) -> HashMap<SeatKey, SeatStatus> {
        self.seat_keys()
            .map(|seat| (seat, self.initial_status(&seat)))
            .collect()
    }
}

impl Default for CabinLayout {
    fn default() -> Self {
        Self::standard()
    }
}
