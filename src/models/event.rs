//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::GatherlyError;

/// Event lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Open,
    Full,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Open => "open",
            EventStatus::Full => "full",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }

    /// Terminal states block all further bookings and transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Cancelled | EventStatus::Completed)
    }
}

impl std::str::FromStr for EventStatus {
    type Err = GatherlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(EventStatus::Open),
            "full" => Ok(EventStatus::Full),
            "cancelled" => Ok(EventStatus::Cancelled),
            "completed" => Ok(EventStatus::Completed),
            other => Err(GatherlyError::Internal(format!(
                "unknown event status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an event charges a joining fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Free,
    Paid,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeStatus::Free => "free",
            FeeStatus::Paid => "paid",
        }
    }
}

impl std::str::FromStr for FeeStatus {
    type Err = GatherlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(FeeStatus::Free),
            "paid" => Ok(FeeStatus::Paid),
            other => Err(GatherlyError::Internal(format!(
                "unknown fee status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub host_id: i64,
    pub title: String,
    pub min_participants: i32,
    pub max_participants: i32,
    pub current_participants: i32,
    pub fee_status: FeeStatus,
    pub joining_fee: f64,
    pub status: EventStatus,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Remaining capacity before the event fills up
    pub fn remaining_slots(&self) -> i32 {
        (self.max_participants - self.current_participants).max(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub min_participants: i32,
    pub max_participants: i32,
    pub fee_status: FeeStatus,
    #[serde(default)]
    pub joining_fee: f64,
}

/// Validated event insert, produced by the event service
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub host_id: i64,
    pub title: String,
    pub min_participants: i32,
    pub max_participants: i32,
    pub fee_status: FeeStatus,
    pub joining_fee: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for status in [
            EventStatus::Open,
            EventStatus::Full,
            EventStatus::Cancelled,
            EventStatus::Completed,
        ] {
            assert_eq!(EventStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(EventStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!EventStatus::Open.is_terminal());
        assert!(!EventStatus::Full.is_terminal());
        assert!(EventStatus::Cancelled.is_terminal());
        assert!(EventStatus::Completed.is_terminal());
    }

    #[test]
    fn test_remaining_slots_floor() {
        let event = Event {
            id: 1,
            host_id: 1,
            title: "Test".to_string(),
            min_participants: 1,
            max_participants: 5,
            current_participants: 5,
            fee_status: FeeStatus::Free,
            joining_fee: 0.0,
            status: EventStatus::Full,
            approved: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(event.remaining_slots(), 0);
    }
}
