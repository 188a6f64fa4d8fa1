//! Services module
//!
//! This module contains business logic services

pub mod booking;
pub mod event;
pub mod payment;
pub mod stripe;

// Re-export commonly used services
pub use booking::{BookingOutcome, BookingService};
pub use event::EventService;
pub use payment::{PaymentIntentDetails, PaymentService};
pub use stripe::{PaymentGateway, StripeGateway};

use std::sync::Arc;

use crate::config::Settings;
use crate::database::DatabaseService;
use crate::utils::clock::Clock;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub booking_service: BookingService,
    pub payment_service: PaymentService,
    pub event_service: EventService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        database: DatabaseService,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        let booking_service = BookingService::new(
            database.events.clone(),
            database.bookings.clone(),
            clock.clone(),
            settings.booking.clone(),
        );
        let payment_service = PaymentService::new(
            database.bookings.clone(),
            database.events.clone(),
            gateway,
            clock,
            settings.payment.clone(),
        );
        let event_service = EventService::new(database.events);

        Self {
            booking_service,
            payment_service,
            event_service,
        }
    }
}
