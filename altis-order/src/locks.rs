use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use altis_shared::SeatKey;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::error::ReservationError;

/// One exclusive lock per seat, with a bounded wait.
///
/// The set of seats is fixed at construction; asking for any other seat is
/// reported as `UnknownSeat`.
pub struct SeatLocks {
    locks: HashMap<SeatKey, Arc<Mutex<()>>>,
    timeout: Duration,
}

pub type SeatGuard = OwnedMutexGuard<()>;

impl SeatLocks {
    pub fn new(seats: impl IntoIterator<Item = SeatKey>, timeout: Duration) -> Self {
        Self {
            locks: seats
                .into_iter()
                .map(|seat| (seat, Arc::new(Mutex::new(()))))
                .collect(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn acquire(&self, seat: &SeatKey) -> Result<SeatGuard, ReservationError> {
        let lock = self
            .locks
            .get(seat)
            .ok_or_else(|| ReservationError::UnknownSeat(seat.to_string()))?;

        match tokio::time::timeout(self.timeout, Arc::clone(lock).lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!(%seat, timeout_ms = self.timeout.as_millis() as u64, "Seat lock wait timed out");
                Err(ReservationError::LockTimeout(*seat))
            }
        }
    }
}
