//! Shared test infrastructure
//!
//! In-memory store implementations, a manually advanced clock and a mock
//! payment gateway, so the booking and payment lifecycles can be exercised
//! deterministically without a database or a real provider.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use gatherly::config::Settings;
use gatherly::database::{BookingStore, EventStore};
use gatherly::models::{
    AuthUser, Booking, BookingState, Event, EventStatus, FeeStatus, NewBooking, NewEvent,
    PaymentState, UserRole,
};
use gatherly::services::stripe::{
    CreateIntentRequest, IntentStatus, PaymentGateway, ProviderIntent,
};
use gatherly::services::{BookingService, EventService, PaymentService};
use gatherly::utils::clock::Clock;
use gatherly::utils::errors::{GatherlyError, ProviderError, ProviderResult, Result};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Clock whose "now" only moves when a test says so
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now = *now + by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Event store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<HashMap<i64, Event>>,
    next_id: AtomicI64,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let event = Event {
            id,
            host_id: event.host_id,
            title: event.title,
            min_participants: event.min_participants,
            max_participants: event.max_participants,
            current_participants: 0,
            fee_status: event.fee_status,
            joining_fee: event.joining_fee,
            status: EventStatus::Open,
            approved: false,
            created_at: now,
            updated_at: now,
        };
        self.events.lock().unwrap().insert(id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        Ok(self.events.lock().unwrap().get(&id).cloned())
    }

    async fn reserve_slot(&self, event_id: i64) -> Result<Option<Event>> {
        let mut events = self.events.lock().unwrap();
        let Some(event) = events.get_mut(&event_id) else {
            return Ok(None);
        };
        if event.status != EventStatus::Open
            || !event.approved
            || event.current_participants >= event.max_participants
        {
            return Ok(None);
        }
        event.current_participants += 1;
        if event.current_participants >= event.max_participants {
            event.status = EventStatus::Full;
        }
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }

    async fn release_slot(&self, event_id: i64) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        if let Some(event) = events.get_mut(&event_id) {
            event.current_participants = (event.current_participants - 1).max(0);
            if event.status == EventStatus::Full {
                event.status = EventStatus::Open;
            }
            event.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_approved(&self, id: i64, approved: bool) -> Result<Event> {
        let mut events = self.events.lock().unwrap();
        let event = events
            .get_mut(&id)
            .ok_or(GatherlyError::EventNotFound { event_id: id })?;
        event.approved = approved;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn transition_status(&self, id: i64, to: EventStatus) -> Result<Option<Event>> {
        let mut events = self.events.lock().unwrap();
        let Some(event) = events.get_mut(&id) else {
            return Ok(None);
        };
        if event.status.is_terminal() {
            return Ok(None);
        }
        event.status = to;
        event.updated_at = Utc::now();
        Ok(Some(event.clone()))
    }
}

// ---------------------------------------------------------------------------
// Booking store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<i64, Booking>>,
    next_id: AtomicI64,
    /// Booking id whose cancellation should fail, for sweep resilience tests
    fail_cancel_for: Mutex<Option<i64>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            fail_cancel_for: Mutex::new(None),
        }
    }

    /// Make `cancel_if_unconfirmed` fail for one booking id
    pub fn fail_cancel_on(&self, id: i64) {
        *self.fail_cancel_for.lock().unwrap() = Some(id);
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: NewBooking) -> Result<Booking> {
        let mut bookings = self.bookings.lock().unwrap();

        // Mirror of the partial unique index on active (user, event) pairs
        let duplicate = bookings.values().any(|b| {
            b.user_id == booking.user_id
                && b.event_id == booking.event_id
                && b.state == BookingState::Active
        });
        if duplicate {
            return Err(GatherlyError::AlreadyBooked);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let booking = Booking {
            id,
            user_id: booking.user_id,
            event_id: booking.event_id,
            state: BookingState::Active,
            payment_state: booking.payment_state,
            expires_at: booking.expires_at,
            payment_intent_id: None,
            transaction_id: None,
            payment_amount: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn find_active(&self, user_id: i64, event_id: i64) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .find(|b| {
                b.user_id == user_id && b.event_id == event_id && b.state == BookingState::Active
            })
            .cloned())
    }

    async fn find_by_intent(&self, intent_id: &str) -> Result<Option<Booking>> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .find(|b| b.payment_intent_id.as_deref() == Some(intent_id))
            .cloned())
    }

    async fn find_expired_unconfirmed(&self, now: DateTime<Utc>) -> Result<Vec<Booking>> {
        let mut stale: Vec<Booking> = self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| {
                b.state == BookingState::Active
                    && b.payment_state != PaymentState::Confirmed
                    && b.expires_at <= now
            })
            .cloned()
            .collect();
        stale.sort_by_key(|b| b.expires_at);
        Ok(stale)
    }

    async fn cancel(&self, id: i64) -> Result<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.state == BookingState::Active => {
                b.state = BookingState::Cancelled;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel_if_unconfirmed(&self, id: i64) -> Result<bool> {
        if *self.fail_cancel_for.lock().unwrap() == Some(id) {
            return Err(GatherlyError::Internal("injected cancel failure".to_string()));
        }

        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b)
                if b.state == BookingState::Active
                    && b.payment_state != PaymentState::Confirmed =>
            {
                b.state = BookingState::Cancelled;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_intent(&self, id: i64, intent_id: &str, amount: f64) -> Result<Booking> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .get_mut(&id)
            .ok_or(GatherlyError::BookingNotFound { booking_id: id })?;
        booking.payment_intent_id = Some(intent_id.to_string());
        booking.payment_amount = Some(amount);
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }

    async fn confirm_payment(
        &self,
        id: i64,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b)
                if b.state == BookingState::Active
                    && b.payment_state != PaymentState::Confirmed =>
            {
                b.payment_state = PaymentState::Confirmed;
                b.transaction_id = Some(transaction_id.to_string());
                b.paid_at = Some(paid_at);
                b.updated_at = paid_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_payment_failed(&self, id: i64) -> Result<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b)
                if b.state == BookingState::Active
                    && b.payment_state != PaymentState::Confirmed =>
            {
                b.payment_state = PaymentState::Failed;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_active_for_event(&self, event_id: i64) -> Result<i64> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.event_id == event_id && b.state == BookingState::Active)
            .count() as i64)
    }
}

// ---------------------------------------------------------------------------
// Payment gateway
// ---------------------------------------------------------------------------

/// Mock provider: intents are held in memory and completed or failed by the
/// test driving the scenario.
#[derive(Default)]
pub struct MockGateway {
    intents: Mutex<HashMap<String, ProviderIntent>>,
    next_id: AtomicI64,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            intents: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Simulate the client completing the charge for an intent
    pub fn complete_intent(&self, intent_id: &str) {
        let mut intents = self.intents.lock().unwrap();
        if let Some(intent) = intents.get_mut(intent_id) {
            intent.status = IntentStatus::Succeeded;
            intent.latest_charge = Some(format!("ch_test_{}", intent.id));
        }
    }

    /// Force an intent into an arbitrary status
    pub fn set_status(&self, intent_id: &str, status: IntentStatus) {
        let mut intents = self.intents.lock().unwrap();
        if let Some(intent) = intents.get_mut(intent_id) {
            intent.status = status;
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(&self, request: CreateIntentRequest) -> ProviderResult<ProviderIntent> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("pi_test_{n}");
        let mut metadata = HashMap::new();
        metadata.insert("booking_id".to_string(), request.booking_id.to_string());
        metadata.insert("user_id".to_string(), request.user_id.to_string());
        metadata.insert("event_id".to_string(), request.event_id.to_string());

        let intent = ProviderIntent {
            id: id.clone(),
            status: IntentStatus::RequiresPaymentMethod,
            client_secret: Some(format!("{id}_secret")),
            latest_charge: None,
            metadata,
        };
        self.intents.lock().unwrap().insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> ProviderResult<ProviderIntent> {
        self.intents
            .lock()
            .unwrap()
            .get(intent_id)
            .cloned()
            .ok_or_else(|| ProviderError::RequestFailed(format!("no such intent: {intent_id}")))
    }
}

// ---------------------------------------------------------------------------
// Test context
// ---------------------------------------------------------------------------

pub struct TestContext {
    pub events: Arc<InMemoryEventStore>,
    pub bookings: Arc<InMemoryBookingStore>,
    pub clock: Arc<ManualClock>,
    pub gateway: Arc<MockGateway>,
    pub booking_service: BookingService,
    pub payment_service: PaymentService,
    pub event_service: EventService,
}

impl TestContext {
    pub fn new() -> Self {
        let mut settings = Settings::default();
        settings.payment.secret_key = "sk_test_key".to_string();
        settings.payment.webhook_secret = WEBHOOK_SECRET.to_string();

        let events = Arc::new(InMemoryEventStore::new());
        let bookings = Arc::new(InMemoryBookingStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let gateway = Arc::new(MockGateway::new());

        let booking_service = BookingService::new(
            events.clone(),
            bookings.clone(),
            clock.clone(),
            settings.booking.clone(),
        );
        let payment_service = PaymentService::new(
            bookings.clone(),
            events.clone(),
            gateway.clone(),
            clock.clone(),
            settings.payment.clone(),
        );
        let event_service = EventService::new(events.clone());

        Self {
            events,
            bookings,
            clock,
            gateway,
            booking_service,
            payment_service,
            event_service,
        }
    }

    /// Create and approve an event, ready to accept bookings
    pub async fn seed_event(
        &self,
        host_id: i64,
        fee_status: FeeStatus,
        joining_fee: f64,
        max_participants: i32,
    ) -> Event {
        let host = AuthUser::new(host_id, UserRole::Host);
        let event = self
            .event_service
            .create_event(
                &host,
                gatherly::models::CreateEventRequest {
                    title: "Test event".to_string(),
                    min_participants: 1,
                    max_participants,
                    fee_status,
                    joining_fee,
                },
            )
            .await
            .expect("seed event");

        self.event_service
            .approve_event(&admin(1000), event.id)
            .await
            .expect("approve seeded event")
    }

    /// Assert the capacity ledger matches the active booking count
    pub async fn assert_capacity_invariant(&self, event_id: i64) {
        let event = self
            .events
            .find_by_id(event_id)
            .await
            .unwrap()
            .expect("event exists");
        let active = self
            .bookings
            .count_active_for_event(event_id)
            .await
            .unwrap();
        assert_eq!(
            i64::from(event.current_participants),
            active,
            "current_participants must equal the active booking count"
        );
        assert!(event.current_participants >= 0);
        assert!(event.current_participants <= event.max_participants);
    }
}

pub fn attendee(id: i64) -> AuthUser {
    AuthUser::new(id, UserRole::Attendee)
}

pub fn host(id: i64) -> AuthUser {
    AuthUser::new(id, UserRole::Host)
}

pub fn admin(id: i64) -> AuthUser {
    AuthUser::new(id, UserRole::Admin)
}
