//! Configuration module

pub mod settings;
pub mod validation;

pub use settings::{
    BookingConfig, DatabaseSettings, LoggingConfig, PaymentConfig, ServerConfig, Settings,
};
