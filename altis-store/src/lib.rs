pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod memory_repo;

pub use app_config::{Config, LedgerBackend, ReservationRules};
pub use booking_repo::PgBookingLedger;
pub use database::DbClient;
pub use memory_repo::InMemoryLedger;
