//! Event endpoints (host/admin surface)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::AppState;
use crate::models::{AuthUser, CreateEventRequest, Event};
use crate::utils::errors::Result;

/// POST /events
pub async fn create_event(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = state
        .services
        .event_service
        .create_event(&user, request)
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /events/:id/approve
pub async fn approve_event(
    user: AuthUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Event>> {
    let event = state
        .services
        .event_service
        .approve_event(&user, event_id)
        .await?;

    Ok(Json(event))
}

/// POST /events/:id/cancel
pub async fn cancel_event(
    user: AuthUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Event>> {
    let event = state
        .services
        .event_service
        .cancel_event(&user, event_id)
        .await?;

    Ok(Json(event))
}

/// POST /events/:id/complete
pub async fn complete_event(
    user: AuthUser,
    Path(event_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Event>> {
    let event = state
        .services
        .event_service
        .complete_event(&user, event_id)
        .await?;

    Ok(Json(event))
}
