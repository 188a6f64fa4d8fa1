//! Database module

pub mod connection;
pub mod repositories;
pub mod service;

pub use connection::{create_pool, health_check, run_migrations, DatabasePool};
pub use repositories::{BookingStore, EventStore, PgBookingRepository, PgEventRepository};
pub use service::DatabaseService;
