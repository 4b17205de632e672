pub mod reference;
pub mod repository;

pub use reference::{ReferenceError, ReferenceGenerator};
pub use repository::{BookingLedger, LedgerError, LedgerResult};
