//! Booking model
//!
//! A booking is one user's reservation against one event. Its lifecycle is a
//! pair of tagged states: `BookingState` tracks whether the booking still
//! holds a capacity slot, `PaymentState` tracks payment reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::GatherlyError;

/// Whether the booking currently holds a capacity slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    Active,
    Cancelled,
}

impl BookingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Active => "active",
            BookingState::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for BookingState {
    type Err = GatherlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BookingState::Active),
            "cancelled" => Ok(BookingState::Cancelled),
            other => Err(GatherlyError::Internal(format!(
                "unknown booking state: {other}"
            ))),
        }
    }
}

/// Payment reconciliation state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Unpaid,
    Confirmed,
    Failed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Unpaid => "unpaid",
            PaymentState::Confirmed => "confirmed",
            PaymentState::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PaymentState {
    type Err = GatherlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentState::Unpaid),
            "confirmed" => Ok(PaymentState::Confirmed),
            "failed" => Ok(PaymentState::Failed),
            other => Err(GatherlyError::Internal(format!(
                "unknown payment state: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub state: BookingState,
    pub payment_state: PaymentState,
    pub expires_at: DateTime<Utc>,
    pub payment_intent_id: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_amount: Option<f64>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.state == BookingState::Active
    }

    pub fn is_confirmed(&self) -> bool {
        self.payment_state == PaymentState::Confirmed
    }
}

/// Booking insert; `state` is always `Active` on creation
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub event_id: i64,
    pub payment_state: PaymentState,
    pub expires_at: DateTime<Utc>,
}
