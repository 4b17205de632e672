pub mod models;
pub mod pii;

pub use models::booking::{BookingRecord, BookingReference, PassengerDetails, ReferenceFormatError};
pub use models::events::{SeatEvent, SeatEventKind};
pub use models::seat::{SeatKey, SeatKeyError};
pub use pii::Masked;
