//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{GatherlyError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_payment_config(&settings.payment)?;
    validate_booking_config(&settings.booking)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate HTTP server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.host.is_empty() {
        return Err(GatherlyError::Config(
            "Server host is required".to_string()
        ));
    }

    if config.port == 0 {
        return Err(GatherlyError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseSettings) -> Result<()> {
    if config.url.is_empty() {
        return Err(GatherlyError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(GatherlyError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(GatherlyError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate payment provider configuration
fn validate_payment_config(config: &super::PaymentConfig) -> Result<()> {
    if config.secret_key.is_empty() {
        return Err(GatherlyError::Config(
            "Payment provider secret key is required".to_string()
        ));
    }

    if config.webhook_secret.is_empty() {
        return Err(GatherlyError::Config(
            "Payment webhook secret is required".to_string()
        ));
    }

    url::Url::parse(&config.api_base).map_err(|e| {
        GatherlyError::Config(format!("Invalid payment API base URL: {e}"))
    })?;

    if config.currency.len() != 3 {
        return Err(GatherlyError::Config(
            format!("Invalid currency code: {}", config.currency)
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(GatherlyError::Config(
            "Payment provider timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate booking lifecycle configuration
fn validate_booking_config(config: &super::BookingConfig) -> Result<()> {
    if config.hold_minutes <= 0 {
        return Err(GatherlyError::Config(
            "Payment hold window must be greater than 0".to_string()
        ));
    }

    if config.free_expiry_days <= 0 {
        return Err(GatherlyError::Config(
            "Free booking expiry horizon must be greater than 0".to_string()
        ));
    }

    if config.sweep_interval_seconds == 0 {
        return Err(GatherlyError::Config(
            "Sweep interval must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(GatherlyError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(GatherlyError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
