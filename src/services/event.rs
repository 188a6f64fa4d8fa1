//! Event service implementation
//!
//! Thin host/admin surface over the event store: creation, admin approval
//! and the host-driven terminal transitions. Detail editing, browsing and
//! everything else event-shaped lives with the wider platform, not here;
//! this service exists so the booking core's preconditions are reachable.

use std::sync::Arc;

use tracing::info;

use crate::database::EventStore;
use crate::models::{AuthUser, CreateEventRequest, Event, EventStatus, FeeStatus, NewEvent, UserRole};
use crate::utils::errors::{GatherlyError, Result};

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
}

impl EventService {
    /// Create a new EventService instance
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Create an event for the calling host. New events start Open and
    /// unapproved; an admin must approve them before bookings are accepted.
    pub async fn create_event(
        &self,
        actor: &AuthUser,
        request: CreateEventRequest,
    ) -> Result<Event> {
        if actor.role != UserRole::Host {
            return Err(GatherlyError::PermissionDenied(
                "Only hosts can create events".to_string(),
            ));
        }

        if request.title.trim().is_empty() {
            return Err(GatherlyError::InvalidInput("Title is required".to_string()));
        }
        if request.min_participants <= 0 {
            return Err(GatherlyError::InvalidInput(
                "Minimum participants must be greater than 0".to_string(),
            ));
        }
        if request.max_participants < request.min_participants {
            return Err(GatherlyError::InvalidInput(
                "Maximum participants cannot be below the minimum".to_string(),
            ));
        }

        let joining_fee = match request.fee_status {
            FeeStatus::Paid if request.joining_fee <= 0.0 => {
                return Err(GatherlyError::InvalidInput(
                    "Paid events require a joining fee greater than 0".to_string(),
                ));
            }
            FeeStatus::Paid => request.joining_fee,
            // Free events never carry a fee, whatever the request says.
            FeeStatus::Free => 0.0,
        };

        let event = self
            .events
            .insert(NewEvent {
                host_id: actor.id,
                title: request.title,
                min_participants: request.min_participants,
                max_participants: request.max_participants,
                fee_status: request.fee_status,
                joining_fee,
            })
            .await?;

        info!(
            event_id = event.id,
            host_id = actor.id,
            "Event created, awaiting approval"
        );
        Ok(event)
    }

    /// Admin approval gate; bookings are only accepted for approved events.
    pub async fn approve_event(&self, actor: &AuthUser, event_id: i64) -> Result<Event> {
        if !actor.is_admin() {
            return Err(GatherlyError::PermissionDenied(
                "Only admins can approve events".to_string(),
            ));
        }

        let event = self.events.set_approved(event_id, true).await?;
        info!(event_id = event_id, admin_id = actor.id, "Event approved");
        Ok(event)
    }

    /// Host-initiated cancellation; terminal, blocks further bookings.
    pub async fn cancel_event(&self, actor: &AuthUser, event_id: i64) -> Result<Event> {
        self.transition(actor, event_id, EventStatus::Cancelled).await
    }

    /// Host-initiated completion; terminal, unlocks reviews downstream.
    pub async fn complete_event(&self, actor: &AuthUser, event_id: i64) -> Result<Event> {
        self.transition(actor, event_id, EventStatus::Completed).await
    }

    async fn transition(
        &self,
        actor: &AuthUser,
        event_id: i64,
        to: EventStatus,
    ) -> Result<Event> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        if event.host_id != actor.id && !actor.is_admin() {
            return Err(GatherlyError::PermissionDenied(
                "Only the event host can change its status".to_string(),
            ));
        }

        // Legal only from Open or Full; the store enforces it atomically.
        let updated = self
            .events
            .transition_status(event_id, to)
            .await?
            .ok_or(GatherlyError::EventNotOpen {
                status: event.status.to_string(),
            })?;

        info!(
            event_id = event_id,
            host_id = actor.id,
            status = %to,
            "Event status changed"
        );
        Ok(updated)
    }
}
