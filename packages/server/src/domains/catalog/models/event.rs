use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::EventId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FestEvent {
    pub id: EventId,
    pub title: String,
    pub tag: String,
    pub department: String,
    /// Standalone entry fee in whole rupees. Checkout always charges the
    /// combo price instead; the fee is display/marketing data.
    pub fee: i64,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub registration_open: bool,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin supplies when creating or editing an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    pub tag: String,
    pub department: String,
    pub fee: i64,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub registration_open: bool,
    pub media_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl FestEvent {
    pub async fn create(input: &EventInput, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO events (id, title, tag, department, fee, venue, starts_at, ends_at, registration_open, media_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(EventId::new())
        .bind(&input.title)
        .bind(&input.tag)
        .bind(&input.department)
        .bind(input.fee)
        .bind(&input.venue)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.registration_open)
        .bind(&input.media_url)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(id: EventId, input: &EventInput, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE events
            SET title = $2, tag = $3, department = $4, fee = $5, venue = $6,
                starts_at = $7, ends_at = $8, registration_open = $9,
                media_url = $10, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.tag)
        .bind(&input.department)
        .bind(input.fee)
        .bind(&input.venue)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.registration_open)
        .bind(&input.media_url)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: EventId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(id: EventId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM events ORDER BY starts_at NULLS LAST, title")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
