//! Booking service implementation
//!
//! This service orchestrates the booking lifecycle: seat reservation with
//! capacity enforcement, cancellation with capacity release, and the expiry
//! sweep that reclaims unpaid holds.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::config::BookingConfig;
use crate::database::{BookingStore, EventStore};
use crate::models::{
    AuthUser, Booking, Event, EventStatus, FeeStatus, NewBooking, PaymentState, UserRole,
};
use crate::utils::clock::Clock;
use crate::utils::errors::{GatherlyError, Result};

/// Outcome of a successful booking attempt
#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub booking: Booking,
    /// The event as of this booking, with the updated participant count
    pub event: Event,
    /// Caller-visible confirmation message, differs by fee status
    pub message: String,
}

/// Booking service for managing the reservation lifecycle
#[derive(Clone)]
pub struct BookingService {
    events: Arc<dyn EventStore>,
    bookings: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
}

impl BookingService {
    /// Create a new BookingService instance
    pub fn new(
        events: Arc<dyn EventStore>,
        bookings: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        Self {
            events,
            bookings,
            clock,
            config,
        }
    }

    /// Reserve a seat on an event for the calling attendee.
    ///
    /// For paid events the booking starts unconfirmed with a payment hold
    /// window; for free events it is confirmed immediately.
    pub async fn book_event(&self, actor: &AuthUser, event_id: i64) -> Result<BookingOutcome> {
        debug!(user_id = actor.id, event_id = event_id, "Booking attempt");

        if actor.role != UserRole::Attendee {
            return Err(GatherlyError::PermissionDenied(
                "Only attendees can book events".to_string(),
            ));
        }

        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        if !event.approved {
            return Err(GatherlyError::EventNotApproved { event_id });
        }
        match event.status {
            EventStatus::Open => {}
            EventStatus::Full => return Err(GatherlyError::EventFull),
            status => {
                return Err(GatherlyError::EventNotOpen {
                    status: status.to_string(),
                })
            }
        }

        // Advisory pre-check; the partial unique index is the real guard.
        if self
            .bookings
            .find_active(actor.id, event_id)
            .await?
            .is_some()
        {
            return Err(GatherlyError::AlreadyBooked);
        }

        // Atomic capacity claim. Zero rows means the event changed between
        // the read above and this update, so re-read for the precise reason.
        let Some(event) = self.events.reserve_slot(event_id).await? else {
            let current = self
                .events
                .find_by_id(event_id)
                .await?
                .ok_or(GatherlyError::EventNotFound { event_id })?;
            return Err(match current.status {
                _ if !current.approved => GatherlyError::EventNotApproved { event_id },
                EventStatus::Full => GatherlyError::EventFull,
                EventStatus::Open => GatherlyError::EventFull,
                status => GatherlyError::EventNotOpen {
                    status: status.to_string(),
                },
            });
        };

        let now = self.clock.now();
        let (payment_state, expires_at) = match event.fee_status {
            FeeStatus::Free => (
                PaymentState::Confirmed,
                now + Duration::days(self.config.free_expiry_days),
            ),
            FeeStatus::Paid => (
                PaymentState::Unpaid,
                now + Duration::minutes(self.config.hold_minutes),
            ),
        };

        let new_booking = NewBooking {
            user_id: actor.id,
            event_id,
            payment_state,
            expires_at,
        };

        let booking = match self.bookings.insert(new_booking).await {
            Ok(booking) => booking,
            Err(e) => {
                // The slot was claimed but the insert lost; hand the slot
                // back before reporting the failure.
                if let Err(release_err) = self.events.release_slot(event_id).await {
                    warn!(
                        event_id = event_id,
                        error = %release_err,
                        "Failed to release slot after booking insert failure"
                    );
                }
                return Err(e);
            }
        };

        info!(
            booking_id = booking.id,
            user_id = actor.id,
            event_id = event_id,
            fee_status = event.fee_status.as_str(),
            "Booking created"
        );

        let message = match event.fee_status {
            FeeStatus::Free => "Booking confirmed".to_string(),
            FeeStatus::Paid => format!(
                "Booking held, complete payment within {} minutes",
                self.config.hold_minutes
            ),
        };

        Ok(BookingOutcome {
            booking,
            event,
            message,
        })
    }

    /// Cancel a booking and release its capacity slot.
    ///
    /// `requested_by` is the self-service caller; system-initiated calls
    /// (the expiry sweep) pass `None` and skip the ownership check.
    pub async fn cancel_booking(&self, booking_id: i64, requested_by: Option<i64>) -> Result<()> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(GatherlyError::BookingNotFound { booking_id })?;

        if let Some(user_id) = requested_by {
            if booking.user_id != user_id {
                warn!(
                    booking_id = booking_id,
                    user_id = user_id,
                    "Cancel attempt by non-owner"
                );
                return Err(GatherlyError::PermissionDenied(
                    "Only the booking owner can cancel it".to_string(),
                ));
            }
        }

        if !booking.is_active() {
            return Err(GatherlyError::BookingNotActive { booking_id });
        }

        // Conditional flip; a concurrent cancel makes this a zero-row update
        // and the slot is only released by whichever call won.
        if !self.bookings.cancel(booking_id).await? {
            return Err(GatherlyError::BookingNotActive { booking_id });
        }

        self.events.release_slot(booking.event_id).await?;

        info!(
            booking_id = booking_id,
            event_id = booking.event_id,
            user_id = booking.user_id,
            "Booking cancelled"
        );

        Ok(())
    }

    /// Cancel all unpaid bookings whose hold window has elapsed.
    ///
    /// Each booking is handled independently; one failure is logged and the
    /// sweep moves on. Returns the number of bookings actually cancelled.
    pub async fn process_expired_bookings(&self) -> Result<u64> {
        let now = self.clock.now();
        let stale = self.bookings.find_expired_unconfirmed(now).await?;

        if stale.is_empty() {
            return Ok(0);
        }

        debug!(candidates = stale.len(), "Expiry sweep starting");

        let mut expired = 0u64;
        for booking in stale {
            match self.expire_booking(&booking).await {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        booking_id = booking.id,
                        error = %e,
                        "Failed to expire booking, continuing sweep"
                    );
                }
            }
        }

        if expired > 0 {
            info!(expired = expired, "Expiry sweep released unpaid holds");
        }

        Ok(expired)
    }

    /// Expire one unpaid booking.
    ///
    /// The store-level guard re-checks the payment state, so a confirmation
    /// that commits first wins the race and this becomes a logged no-op.
    async fn expire_booking(&self, booking: &Booking) -> Result<bool> {
        if !self.bookings.cancel_if_unconfirmed(booking.id).await? {
            debug!(
                booking_id = booking.id,
                "Booking confirmed or cancelled mid-sweep, skipping"
            );
            return Ok(false);
        }

        self.events.release_slot(booking.event_id).await?;

        info!(
            booking_id = booking.id,
            event_id = booking.event_id,
            user_id = booking.user_id,
            "Expired unpaid booking cancelled"
        );

        Ok(true)
    }
}
