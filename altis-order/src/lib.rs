pub mod error;
pub mod locks;
pub mod reservation;

pub use error::ReservationError;
pub use locks::SeatLocks;
pub use reservation::ReservationService;
