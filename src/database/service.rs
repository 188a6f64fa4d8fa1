//! Database service layer
//!
//! Bundles the storage implementations behind their trait objects so the
//! service layer never sees a concrete repository type.

use std::sync::Arc;

use crate::database::repositories::{
    BookingStore, EventStore, PgBookingRepository, PgEventRepository,
};
use crate::database::DatabasePool;

#[derive(Clone)]
pub struct DatabaseService {
    pub events: Arc<dyn EventStore>,
    pub bookings: Arc<dyn BookingStore>,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: Arc::new(PgEventRepository::new(pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(pool)),
        }
    }
}
