use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cabin position: decimal row followed by a single column symbol, e.g. `12C`.
///
/// Ordering is row-major by row number, then by column symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatKey {
    row: u16,
    column: char,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatKeyError {
    #[error("Seat key is empty")]
    Empty,

    #[error("Seat key {0:?} has no row number")]
    MissingRow(String),

    #[error("Seat key {0:?} has an invalid row number")]
    InvalidRow(String),

    #[error("Seat key {0:?} has an invalid column symbol")]
    InvalidColumn(String),
}

impl SeatKey {
    pub fn new(row: u16, column: char) -> Self {
        Self { row, column }
    }

    pub fn row(&self) -> u16 {
        self.row
    }

    pub fn column(&self) -> char {
        self.column
    }
}

impl fmt::Display for SeatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.column)
    }
}

impl FromStr for SeatKey {
    type Err = SeatKeyError;

    /// Parses keys verbatim: no trimming, no case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let column = s.chars().last().ok_or(SeatKeyError::Empty)?;
        if column.is_ascii_digit() || column.is_whitespace() {
            return Err(SeatKeyError::InvalidColumn(s.to_string()));
        }

        let digits = &s[..s.len() - column.len_utf8()];
        if digits.is_empty() {
            return Err(SeatKeyError::MissingRow(s.to_string()));
        }
        // u16::from_str accepts a leading '+', which never appears in a seat key
        if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
            return Err(SeatKeyError::InvalidRow(s.to_string()));
        }

        let row = digits
            .parse::<u16>()
            .map_err(|_| SeatKeyError::InvalidRow(s.to_string()))?;

        Ok(Self { row, column })
    }
}

impl TryFrom<String> for SeatKey {
    type Error = SeatKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatKey> for String {
    fn from(key: SeatKey) -> Self {
        key.to_string()
    }
}
