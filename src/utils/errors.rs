//! Error handling for Gatherly
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy, including the mapping of
//! domain errors onto HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for the Gatherly application
#[derive(Error, Debug)]
pub enum GatherlyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Payment provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Booking not found: {booking_id}")]
    BookingNotFound { booking_id: i64 },

    #[error("Event is not approved for booking")]
    EventNotApproved { event_id: i64 },

    #[error("Event is not open for booking: {status}")]
    EventNotOpen { status: String },

    #[error("Maximum participants reached")]
    EventFull,

    #[error("You have already booked this event")]
    AlreadyBooked,

    #[error("Booking is no longer active")]
    BookingNotActive { booking_id: i64 },

    #[error("Booking has expired")]
    BookingExpired { booking_id: i64 },

    #[error("This event is free, no payment is required")]
    NoPaymentRequired,

    #[error("Payment has already been confirmed")]
    PaymentAlreadyConfirmed,

    #[error("Payment intent does not match this booking")]
    PaymentIntentMismatch,

    #[error("Payment not completed, status: {status}")]
    PaymentNotCompleted { status: String },

    #[error("Webhook signature verification failed: {0}")]
    WebhookSignature(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payment provider specific errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider request timed out")]
    Timeout,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Payment provider unavailable")]
    ServiceUnavailable,
}

/// Result type alias for Gatherly operations
pub type Result<T> = std::result::Result<T, GatherlyError>;

/// Result type alias for payment provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl GatherlyError {
    /// HTTP status code this error surfaces as
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatherlyError::EventNotFound { .. } | GatherlyError::BookingNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            GatherlyError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            GatherlyError::EventFull
            | GatherlyError::AlreadyBooked
            | GatherlyError::PaymentAlreadyConfirmed
            | GatherlyError::PaymentIntentMismatch => StatusCode::CONFLICT,
            GatherlyError::EventNotApproved { .. }
            | GatherlyError::EventNotOpen { .. }
            | GatherlyError::BookingNotActive { .. }
            | GatherlyError::BookingExpired { .. }
            | GatherlyError::NoPaymentRequired
            | GatherlyError::PaymentNotCompleted { .. }
            | GatherlyError::WebhookSignature(_)
            | GatherlyError::Serialization(_)
            | GatherlyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatherlyError::Provider(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if the error is recoverable by retrying the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GatherlyError::Provider(_) | GatherlyError::Io(_) | GatherlyError::Database(_)
        )
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatherlyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Server-side faults carry internals the client should not see.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            match status {
                StatusCode::BAD_GATEWAY => "Payment provider unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
