pub mod inventory;
pub mod layout;

pub use inventory::{SeatCounts, SeatMap, SeatMapError, SeatMapRecoveryError, SeatRow, SeatStatus};
pub use layout::{CabinLayout, LayoutError};
