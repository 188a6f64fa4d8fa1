//! Storage contracts and their PostgreSQL implementations
//!
//! The booking and payment services talk to storage through the `EventStore`
//! and `BookingStore` traits. The capacity and uniqueness invariants live
//! down here: `reserve_slot` is a single conditional update (never a
//! read-then-write), and duplicate active bookings are rejected by a partial
//! unique index rather than application code.

pub mod booking;
pub mod event;

pub use booking::PgBookingRepository;
pub use event::PgEventRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Booking, Event, EventStatus, NewBooking, NewEvent};
use crate::utils::errors::Result;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: NewEvent) -> Result<Event>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>>;

    /// Atomically claim one capacity slot.
    ///
    /// Increments `current_participants` only while the event is open,
    /// approved and below capacity, flipping the status to `Full` when the
    /// new count reaches the maximum. Returns the updated event, or `None`
    /// when the precondition no longer holds; the caller re-reads the event
    /// to report the precise reason.
    async fn reserve_slot(&self, event_id: i64) -> Result<Option<Event>>;

    /// Release one capacity slot.
    ///
    /// Decrements `current_participants` with a floor of zero and flips
    /// `Full` back to `Open`. Terminal statuses are never repaired.
    async fn release_slot(&self, event_id: i64) -> Result<()>;

    async fn set_approved(&self, id: i64, approved: bool) -> Result<Event>;

    /// Host-driven transition into a terminal status, legal only from
    /// `Open` or `Full`. Returns `None` when the event is already terminal.
    async fn transition_status(&self, id: i64, to: EventStatus) -> Result<Option<Event>>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Insert a new active booking.
    ///
    /// A second active booking for the same (user, event) pair must fail
    /// with `GatherlyError::AlreadyBooked`, regardless of any pre-check the
    /// caller performed.
    async fn insert(&self, booking: NewBooking) -> Result<Booking>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>>;

    async fn find_active(&self, user_id: i64, event_id: i64) -> Result<Option<Booking>>;

    async fn find_by_intent(&self, intent_id: &str) -> Result<Option<Booking>>;

    /// Active bookings without a confirmed payment whose hold window has
    /// elapsed. Failed charge attempts count: they are unconfirmed too.
    async fn find_expired_unconfirmed(&self, now: DateTime<Utc>) -> Result<Vec<Booking>>;

    /// Flip `Active -> Cancelled`. Returns whether this call performed the
    /// transition; `false` means the booking was missing or already
    /// cancelled.
    async fn cancel(&self, id: i64) -> Result<bool>;

    /// Like `cancel`, but only while the payment is not confirmed. The
    /// expiry sweep uses this so a confirmation that lands first wins.
    async fn cancel_if_unconfirmed(&self, id: i64) -> Result<bool>;

    async fn record_intent(&self, id: i64, intent_id: &str, amount: f64) -> Result<Booking>;

    /// Apply payment confirmation effects exactly once. Returns whether this
    /// call performed the transition; `false` means the booking was already
    /// confirmed, cancelled or missing, and no field changed.
    async fn confirm_payment(
        &self,
        id: i64,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Mark a failed charge attempt. The booking stays unconfirmed and
    /// remains subject to the expiry sweep.
    async fn mark_payment_failed(&self, id: i64) -> Result<bool>;

    async fn count_active_for_event(&self, event_id: i64) -> Result<i64>;
}
