//! Payment reconciliation service
//!
//! Two entry points converge on a booking's payment confirmation: the
//! client's direct `confirm_payment` call and the provider's webhook. Both
//! funnel through `apply_confirmation`, whose store-level guard makes the
//! effects apply exactly once no matter the arrival order.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PaymentConfig;
use crate::database::{BookingStore, EventStore};
use crate::models::{AuthUser, Booking, FeeStatus};
use crate::services::stripe::{
    verify_webhook_signature, CreateIntentRequest, IntentStatus, PaymentGateway, ProviderIntent,
    WebhookEvent,
};
use crate::utils::clock::Clock;
use crate::utils::errors::{GatherlyError, Result};

/// Convert a fee in major units to the provider's minor-unit representation
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Connection details the client needs to complete payment
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentIntentDetails {
    pub client_secret: String,
    pub intent_id: String,
    /// Charge amount in major units
    pub amount: f64,
}

/// Payment service coordinating booking confirmation with the provider
#[derive(Clone)]
pub struct PaymentService {
    bookings: Arc<dyn BookingStore>,
    events: Arc<dyn EventStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    config: PaymentConfig,
}

impl PaymentService {
    /// Create a new PaymentService instance
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        events: Arc<dyn EventStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        config: PaymentConfig,
    ) -> Self {
        Self {
            bookings,
            events,
            gateway,
            clock,
            config,
        }
    }

    /// Open a payment intent with the provider for an unpaid booking.
    pub async fn create_payment_intent(
        &self,
        actor: &AuthUser,
        booking_id: i64,
    ) -> Result<PaymentIntentDetails> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(GatherlyError::BookingNotFound { booking_id })?;

        if booking.user_id != actor.id {
            return Err(GatherlyError::PermissionDenied(
                "Only the booking owner can pay for it".to_string(),
            ));
        }
        if booking.is_confirmed() {
            return Err(GatherlyError::PaymentAlreadyConfirmed);
        }
        if !booking.is_active() {
            return Err(GatherlyError::BookingNotActive { booking_id });
        }
        // Defensive re-check ahead of the sweep: an expired hold must not
        // open a fresh intent even if the scheduler has not run yet.
        if self.clock.now() > booking.expires_at {
            return Err(GatherlyError::BookingExpired { booking_id });
        }

        let event = self
            .events
            .find_by_id(booking.event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound {
                event_id: booking.event_id,
            })?;

        if event.fee_status == FeeStatus::Free {
            return Err(GatherlyError::NoPaymentRequired);
        }

        let intent = self
            .gateway
            .create_intent(CreateIntentRequest {
                amount_minor: to_minor_units(event.joining_fee),
                currency: self.config.currency.clone(),
                booking_id: booking.id,
                user_id: booking.user_id,
                event_id: event.id,
            })
            .await?;

        let booking = self
            .bookings
            .record_intent(booking.id, &intent.id, event.joining_fee)
            .await?;

        info!(
            booking_id = booking.id,
            intent_id = %intent.id,
            amount = event.joining_fee,
            "Payment intent created"
        );

        Ok(PaymentIntentDetails {
            client_secret: intent.client_secret.unwrap_or_default(),
            intent_id: intent.id,
            amount: event.joining_fee,
        })
    }

    /// Direct confirmation path, called by the client after it completes the
    /// charge. Verifies the provider's view of the intent before applying.
    pub async fn confirm_payment(
        &self,
        actor: &AuthUser,
        booking_id: i64,
        intent_id: &str,
    ) -> Result<Booking> {
        let intent = self.gateway.retrieve_intent(intent_id).await?;

        if intent.status != IntentStatus::Succeeded {
            return Err(GatherlyError::PaymentNotCompleted {
                status: intent.status.to_string(),
            });
        }

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(GatherlyError::BookingNotFound { booking_id })?;

        if booking.user_id != actor.id {
            return Err(GatherlyError::PermissionDenied(
                "Only the booking owner can confirm its payment".to_string(),
            ));
        }
        if booking.payment_intent_id.as_deref() != Some(intent_id) {
            return Err(GatherlyError::PaymentIntentMismatch);
        }

        // Idempotency guard: the webhook may have landed first.
        if !self.apply_confirmation(booking.id, &intent).await? {
            return Err(GatherlyError::PaymentAlreadyConfirmed);
        }

        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(GatherlyError::BookingNotFound { booking_id })
    }

    /// Asynchronous confirmation path, driven by the provider.
    ///
    /// The signature is verified before the payload is trusted. Beyond that,
    /// failures here are logged rather than surfaced: the provider's retry
    /// cannot usefully change a missing or already-settled booking.
    pub async fn handle_webhook(&self, payload: &[u8], signature_header: &str) -> Result<()> {
        verify_webhook_signature(
            payload,
            signature_header,
            &self.config.webhook_secret,
            Duration::from_secs(self.config.webhook_tolerance_seconds),
            self.clock.now(),
        )?;

        let event: WebhookEvent = serde_json::from_slice(payload)?;
        let intent = &event.data.object;

        match event.event_type.as_str() {
            "payment_intent.succeeded" => {
                match self.bookings.find_by_intent(&intent.id).await? {
                    None => {
                        warn!(
                            intent_id = %intent.id,
                            "Webhook for unknown payment intent, ignoring"
                        );
                    }
                    Some(booking) if booking.is_confirmed() => {
                        debug!(
                            booking_id = booking.id,
                            "Webhook replay for confirmed booking, ignoring"
                        );
                    }
                    Some(booking) => {
                        if self.apply_confirmation(booking.id, intent).await? {
                            info!(
                                booking_id = booking.id,
                                intent_id = %intent.id,
                                "Payment confirmed via webhook"
                            );
                        }
                    }
                }
            }
            "payment_intent.payment_failed" => {
                match self.bookings.find_by_intent(&intent.id).await? {
                    None => {
                        warn!(
                            intent_id = %intent.id,
                            "Failure webhook for unknown payment intent, ignoring"
                        );
                    }
                    Some(booking) => {
                        if self.bookings.mark_payment_failed(booking.id).await? {
                            info!(
                                booking_id = booking.id,
                                intent_id = %intent.id,
                                "Payment attempt failed, booking remains unconfirmed"
                            );
                        }
                    }
                }
            }
            other => {
                debug!(event_type = other, "Ignoring unhandled webhook event type");
            }
        }

        Ok(())
    }

    /// The single internal confirmation operation both paths funnel through.
    ///
    /// Returns whether this call applied the effects; `false` means another
    /// path got there first and nothing changed.
    async fn apply_confirmation(&self, booking_id: i64, intent: &ProviderIntent) -> Result<bool> {
        let transaction_id = intent
            .latest_charge
            .clone()
            .unwrap_or_else(|| intent.id.clone());

        let applied = self
            .bookings
            .confirm_payment(booking_id, &transaction_id, self.clock.now())
            .await?;

        if applied {
            info!(
                booking_id = booking_id,
                transaction_id = %transaction_id,
                "Payment confirmation applied"
            );
        }

        Ok(applied)
    }
}
