//! HTTP API
//!
//! Routes, shared state and request plumbing for the booking, payment and
//! event endpoints.

pub mod bookings;
pub mod events;
pub mod extract;
pub mod payments;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::database::DatabasePool;
use crate::services::ServiceFactory;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: DatabasePool,
    pub services: ServiceFactory,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/:id", delete(bookings::cancel_booking))
        .route("/payments/create-intent", post(payments::create_intent))
        .route("/payments/confirm", post(payments::confirm_payment))
        .route("/payments/webhook", post(payments::webhook))
        .route("/events", post(events::create_event))
        .route("/events/:id/approve", post(events::approve_event))
        .route("/events/:id/cancel", post(events::cancel_event))
        .route("/events/:id/complete", post(events::complete_event))
        .route("/admin/bookings/sweep", post(bookings::sweep_expired))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match crate::database::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok" })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "degraded" })),
            )
        }
    }
}
