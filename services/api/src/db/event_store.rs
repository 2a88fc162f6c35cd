//! Postgres-backed event store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use evently_id::EventId;
use sqlx::{postgres::PgPool, postgres::PgRow, Row};

use super::DbError;
use crate::events::Event;
use crate::store::{EventStore, StoreError};

/// A row from the events table.
#[derive(Debug, Clone)]
struct EventRow {
    event_id: String,
    title: String,
    description: String,
    date: String,
    time: String,
    location: String,
    organizer: String,
    attendees: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for EventRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            event_id: row.try_get("event_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            date: row.try_get("date")?,
            time: row.try_get("time")?,
            location: row.try_get("location")?,
            organizer: row.try_get("organizer")?,
            attendees: row.try_get("attendees")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let id = EventId::parse(&row.event_id).map_err(|e| StoreError::Corrupt {
            id: row.event_id.clone(),
            reason: e.to_string(),
        })?;

        Ok(Event {
            id,
            title: row.title,
            description: row.description,
            date: row.date,
            time: row.time,
            location: row.location,
            organizer: row.organizer,
            attendees: row.attendees,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_EVENT: &str = r#"
    SELECT event_id, title, description, date, time, location,
           organizer, attendees, created_at, updated_at
    FROM events
"#;

/// Event store over the `events` table.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events (
                event_id, title, description, date, time, location,
                organizer, attendees, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(&event.organizer)
        .bind(&event.attendees)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::Query)?;

        Ok(())
    }

    async fn find(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        let query = format!("{SELECT_EVENT} WHERE event_id = $1");
        let row = sqlx::query_as::<_, EventRow>(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;

        row.map(Event::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        let query = format!("{SELECT_EVENT} ORDER BY created_at ASC, event_id ASC");
        let rows = sqlx::query_as::<_, EventRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::Query)?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn save(&self, event: &Event) -> Result<bool, StoreError> {
        // organizer is never written after insert.
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                date = $4,
                time = $5,
                location = $6,
                attendees = $7,
                updated_at = $8
            WHERE event_id = $1
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(&event.attendees)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::Query)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, id: &EventId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE event_id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;

        Ok(result.rows_affected() == 1)
    }

    async fn usernames(&self, user_ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT user_id, username
            FROM users
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Query)?;

        Ok(rows.into_iter().collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(())
    }
}
