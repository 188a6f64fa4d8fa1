//! Event repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::EventStore;
use crate::models::{Event, EventStatus, FeeStatus, NewEvent};
use crate::utils::errors::{GatherlyError, Result};

const EVENT_COLUMNS: &str = "id, host_id, title, min_participants, max_participants, \
     current_participants, fee_status, joining_fee, status, approved, created_at, updated_at";

/// Raw `events` row; status columns are stored as TEXT
#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    host_id: i64,
    title: String,
    min_participants: i32,
    max_participants: i32,
    current_participants: i32,
    fee_status: String,
    joining_fee: f64,
    status: String,
    approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = GatherlyError;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Event {
            id: row.id,
            host_id: row.host_id,
            title: row.title,
            min_participants: row.min_participants,
            max_participants: row.max_participants,
            current_participants: row.current_participants,
            fee_status: row.fee_status.parse::<FeeStatus>()?,
            joining_fee: row.joining_fee,
            status: row.status.parse::<EventStatus>()?,
            approved: row.approved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventRepository {
    async fn insert(&self, event: NewEvent) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (host_id, title, min_participants, max_participants,
                                current_participants, fee_status, joining_fee, status,
                                approved, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $5, $6, 'open', FALSE, $7, $7)
            RETURNING id, host_id, title, min_participants, max_participants,
                      current_participants, fee_status, joining_fee, status, approved,
                      created_at, updated_at
            "#,
        )
        .bind(event.host_id)
        .bind(event.title)
        .bind(event.min_participants)
        .bind(event.max_participants)
        .bind(event.fee_status.as_str())
        .bind(event.joining_fee)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    async fn reserve_slot(&self, event_id: i64) -> Result<Option<Event>> {
        // The WHERE clause is the capacity check; check and increment commit
        // together or not at all, so the counter can never pass the maximum.
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET current_participants = current_participants + 1,
                status = CASE WHEN current_participants + 1 >= max_participants
                              THEN 'full' ELSE status END,
                updated_at = $2
            WHERE id = $1
              AND status = 'open'
              AND approved = TRUE
              AND current_participants < max_participants
            RETURNING id, host_id, title, min_participants, max_participants,
                      current_participants, fee_status, joining_fee, status, approved,
                      created_at, updated_at
            "#,
        )
        .bind(event_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    async fn release_slot(&self, event_id: i64) -> Result<()> {
        // Floor at zero guards against a double release; only Full is
        // repaired back to Open, terminal statuses stay as they are.
        sqlx::query(
            r#"
            UPDATE events
            SET current_participants = GREATEST(current_participants - 1, 0),
                status = CASE WHEN status = 'full' THEN 'open' ELSE status END,
                updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_approved(&self, id: i64, approved: bool) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET approved = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, host_id, title, min_participants, max_participants,
                      current_participants, fee_status, joining_fee, status, approved,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(approved)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(GatherlyError::EventNotFound { event_id: id }),
        }
    }

    async fn transition_status(&self, id: i64, to: EventStatus) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status IN ('open', 'full')
            RETURNING id, host_id, title, min_participants, max_participants,
                      current_participants, fee_status, joining_fee, status, approved,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }
}
