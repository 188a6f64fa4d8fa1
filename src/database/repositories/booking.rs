//! Booking repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::BookingStore;
use crate::models::{Booking, BookingState, NewBooking, PaymentState};
use crate::utils::errors::{GatherlyError, Result};

const BOOKING_COLUMNS: &str = "id, user_id, event_id, state, payment_state, expires_at, \
     payment_intent_id, transaction_id, payment_amount, paid_at, created_at, updated_at";

/// Raw `bookings` row; state columns are stored as TEXT
#[derive(Debug, FromRow)]
struct BookingRow {
    id: i64,
    user_id: i64,
    event_id: i64,
    state: String,
    payment_state: String,
    expires_at: DateTime<Utc>,
    payment_intent_id: Option<String>,
    transaction_id: Option<String>,
    payment_amount: Option<f64>,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = GatherlyError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            state: row.state.parse::<BookingState>()?,
            payment_state: row.payment_state.parse::<PaymentState>()?,
            expires_at: row.expires_at,
            payment_intent_id: row.payment_intent_id,
            transaction_id: row.transaction_id,
            payment_amount: row.payment_amount,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingRepository {
    async fn insert(&self, booking: NewBooking) -> Result<Booking> {
        let result = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (user_id, event_id, state, payment_state, expires_at,
                                  created_at, updated_at)
            VALUES ($1, $2, 'active', $3, $4, $5, $5)
            RETURNING id, user_id, event_id, state, payment_state, expires_at,
                      payment_intent_id, transaction_id, payment_amount, paid_at,
                      created_at, updated_at
            "#,
        )
        .bind(booking.user_id)
        .bind(booking.event_id)
        .bind(booking.payment_state.as_str())
        .bind(booking.expires_at)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.try_into(),
            // The partial unique index on active (user_id, event_id) pairs is
            // the authoritative double-booking guard.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(GatherlyError::AlreadyBooked)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_active(&self, user_id: i64, event_id: i64) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE user_id = $1 AND event_id = $2 AND state = 'active'"
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_by_intent(&self, intent_id: &str) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE payment_intent_id = $1"
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Booking::try_from).transpose()
    }

    async fn find_expired_unconfirmed(&self, now: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE state = 'active' AND payment_state <> 'confirmed' AND expires_at <= $1 \
             ORDER BY expires_at ASC"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn cancel(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET state = 'cancelled', updated_at = $2
            WHERE id = $1 AND state = 'active'
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cancel_if_unconfirmed(&self, id: i64) -> Result<bool> {
        // Guarding on payment_state makes the sweep lose the race against a
        // concurrent confirmation instead of cancelling a just-paid booking.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET state = 'cancelled', updated_at = $2
            WHERE id = $1 AND state = 'active' AND payment_state <> 'confirmed'
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_intent(&self, id: i64, intent_id: &str, amount: f64) -> Result<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings
            SET payment_intent_id = $2, payment_amount = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, user_id, event_id, state, payment_state, expires_at,
                      payment_intent_id, transaction_id, payment_amount, paid_at,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(intent_id)
        .bind(amount)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(GatherlyError::BookingNotFound { booking_id: id }),
        }
    }

    async fn confirm_payment(
        &self,
        id: i64,
        transaction_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        // Single idempotency gate for both the direct confirmation call and
        // the webhook: whichever lands second affects zero rows.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_state = 'confirmed', transaction_id = $2, paid_at = $3,
                updated_at = $3
            WHERE id = $1 AND state = 'active' AND payment_state <> 'confirmed'
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .bind(paid_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_payment_failed(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_state = 'failed', updated_at = $2
            WHERE id = $1 AND state = 'active' AND payment_state <> 'confirmed'
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_active_for_event(&self, event_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE event_id = $1 AND state = 'active'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
