//! Booking endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::models::{AuthUser, Booking, Event};
use crate::utils::errors::{GatherlyError, Result};

#[derive(Debug, Deserialize)]
pub struct BookEventRequest {
    pub event_id: i64,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking: Booking,
    pub event: Event,
    pub message: String,
}

/// POST /bookings
pub async fn create_booking(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<BookEventRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let outcome = state
        .services
        .booking_service
        .book_event(&user, request.event_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking: outcome.booking,
            event: outcome.event,
            message: outcome.message,
        }),
    ))
}

/// DELETE /bookings/:id
pub async fn cancel_booking(
    user: AuthUser,
    Path(booking_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    state
        .services
        .booking_service
        .cancel_booking(booking_id, Some(user.id))
        .await?;

    Ok(Json(serde_json::json!({ "cancelled": true })))
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub expired: u64,
}

/// POST /admin/bookings/sweep
///
/// Manual trigger for the expiry sweep, admin only. The recurring scheduler
/// does the same work on its own cadence.
pub async fn sweep_expired(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<SweepResponse>> {
    if !user.is_admin() {
        return Err(GatherlyError::PermissionDenied(
            "Only admins can trigger the expiry sweep".to_string(),
        ));
    }

    let expired = state
        .services
        .booking_service
        .process_expired_bookings()
        .await?;

    Ok(Json(SweepResponse { expired }))
}
