//! Gatherly booking service
//!
//! The booking-lifecycle and capacity-control backend of the Gatherly event
//! platform. This library provides seat reservation with strict capacity
//! invariants, payment-gated confirmation against an external provider, and
//! the background sweep that reclaims unpaid holds.

pub mod api;
pub mod config;
pub mod database;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{GatherlyError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use scheduler::ExpiryScheduler;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
