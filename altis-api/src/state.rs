use std::sync::Arc;

use altis_order::ReservationService;

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationService>,
}

impl AppState {
    pub fn new(reservations: Arc<ReservationService>) -> Self {
        Self { reservations }
    }
}
