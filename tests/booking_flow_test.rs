//! Booking lifecycle integration tests

mod helpers;

use assert_matches::assert_matches;
use gatherly::database::{BookingStore, EventStore};
use gatherly::models::{BookingState, EventStatus, FeeStatus, PaymentState};
use gatherly::utils::errors::GatherlyError;
use helpers::{admin, attendee, host, TestContext};

#[tokio::test]
async fn free_event_booking_is_confirmed_immediately() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 1).await;

    let outcome = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();

    assert_eq!(outcome.booking.state, BookingState::Active);
    assert_eq!(outcome.booking.payment_state, PaymentState::Confirmed);
    assert_eq!(outcome.event.current_participants, 1);
    assert_eq!(outcome.event.status, EventStatus::Full);
    assert_eq!(outcome.message, "Booking confirmed");

    ctx.assert_capacity_invariant(event.id).await;
}

#[tokio::test]
async fn paid_event_booking_is_held_with_expiry() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Paid, 20.0, 5).await;

    let outcome = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();

    assert_eq!(outcome.booking.payment_state, PaymentState::Unpaid);
    let hold = outcome.booking.expires_at - ctx.clock.now();
    assert_eq!(hold.num_minutes(), 30);
    assert!(outcome.message.contains("30 minutes"));
}

#[tokio::test]
async fn hosts_and_admins_cannot_book() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;

    for actor in [host(2), admin(3)] {
        let result = ctx.booking_service.book_event(&actor, event.id).await;
        assert_matches!(result, Err(GatherlyError::PermissionDenied(_)));
    }
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let ctx = TestContext::new();
    let result = ctx.booking_service.book_event(&attendee(10), 999).await;
    assert_matches!(result, Err(GatherlyError::EventNotFound { event_id: 999 }));
}

#[tokio::test]
async fn unapproved_event_rejects_bookings() {
    let ctx = TestContext::new();
    let event = ctx
        .event_service
        .create_event(
            &host(1),
            gatherly::models::CreateEventRequest {
                title: "Pending".to_string(),
                min_participants: 1,
                max_participants: 5,
                fee_status: FeeStatus::Free,
                joining_fee: 0.0,
            },
        )
        .await
        .unwrap();

    let result = ctx.booking_service.book_event(&attendee(10), event.id).await;
    assert_matches!(result, Err(GatherlyError::EventNotApproved { .. }));
}

#[tokio::test]
async fn cancelled_event_rejects_bookings() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;
    ctx.event_service.cancel_event(&host(1), event.id).await.unwrap();

    let result = ctx.booking_service.book_event(&attendee(10), event.id).await;
    assert_matches!(result, Err(GatherlyError::EventNotOpen { .. }));
}

#[tokio::test]
async fn duplicate_active_booking_conflicts() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;

    ctx.booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();
    let result = ctx.booking_service.book_event(&attendee(10), event.id).await;

    assert_matches!(result, Err(GatherlyError::AlreadyBooked));
    ctx.assert_capacity_invariant(event.id).await;
}

#[tokio::test]
async fn full_event_conflicts_with_capacity_message() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 1).await;

    ctx.booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();
    let result = ctx.booking_service.book_event(&attendee(11), event.id).await;

    assert_matches!(result, Err(GatherlyError::EventFull));
    assert_eq!(
        result.unwrap_err().to_string(),
        "Maximum participants reached"
    );
    ctx.assert_capacity_invariant(event.id).await;
}

#[tokio::test]
async fn cancelling_reopens_a_full_event() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 2).await;

    let first = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();
    ctx.booking_service
        .book_event(&attendee(11), event.id)
        .await
        .unwrap();

    let full = ctx.events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(full.status, EventStatus::Full);

    ctx.booking_service
        .cancel_booking(first.booking.id, Some(10))
        .await
        .unwrap();

    let reopened = ctx.events.find_by_id(event.id).await.unwrap().unwrap();
    assert_eq!(reopened.status, EventStatus::Open);
    assert_eq!(reopened.current_participants, 1);
    ctx.assert_capacity_invariant(event.id).await;
}

#[tokio::test]
async fn cancel_requires_ownership() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;

    let outcome = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();

    let result = ctx
        .booking_service
        .cancel_booking(outcome.booking.id, Some(11))
        .await;
    assert_matches!(result, Err(GatherlyError::PermissionDenied(_)));

    // The booking is untouched
    let booking = ctx
        .bookings
        .find_by_id(outcome.booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(booking.state, BookingState::Active);
}

#[tokio::test]
async fn re_cancelling_is_an_error_not_a_noop() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;

    let outcome = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();

    ctx.booking_service
        .cancel_booking(outcome.booking.id, Some(10))
        .await
        .unwrap();
    let result = ctx
        .booking_service
        .cancel_booking(outcome.booking.id, Some(10))
        .await;

    assert_matches!(result, Err(GatherlyError::BookingNotActive { .. }));
    // The slot must have been released exactly once
    ctx.assert_capacity_invariant(event.id).await;
}

#[tokio::test]
async fn system_cancel_skips_ownership_check() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;

    let outcome = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();

    ctx.booking_service
        .cancel_booking(outcome.booking.id, None)
        .await
        .unwrap();

    let booking = ctx
        .bookings
        .find_by_id(outcome.booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(booking.state, BookingState::Cancelled);
}

#[tokio::test]
async fn rebooking_after_cancellation_is_allowed() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;

    let first = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();
    ctx.booking_service
        .cancel_booking(first.booking.id, Some(10))
        .await
        .unwrap();

    let second = ctx
        .booking_service
        .book_event(&attendee(10), event.id)
        .await
        .unwrap();
    assert_ne!(second.booking.id, first.booking.id);
    ctx.assert_capacity_invariant(event.id).await;
}

#[tokio::test]
async fn host_transitions_are_owner_only_and_terminal() {
    let ctx = TestContext::new();
    let event = ctx.seed_event(1, FeeStatus::Free, 0.0, 5).await;

    let result = ctx.event_service.complete_event(&host(2), event.id).await;
    assert_matches!(result, Err(GatherlyError::PermissionDenied(_)));

    ctx.event_service
        .complete_event(&host(1), event.id)
        .await
        .unwrap();

    // Terminal: a second transition is rejected
    let result = ctx.event_service.cancel_event(&host(1), event.id).await;
    assert_matches!(result, Err(GatherlyError::EventNotOpen { .. }));
}
