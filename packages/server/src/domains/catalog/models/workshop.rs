use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::WorkshopId;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workshop {
    pub id: WorkshopId,
    pub title: String,
    pub description: String,
    pub departments: Vec<String>,
    pub lecturers: Vec<String>,
    /// Standalone price in whole rupees; checkout charges the combo price.
    pub price: i64,
    pub registration_open: bool,
    pub media_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin supplies when creating or editing a workshop.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkshopInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub lecturers: Vec<String>,
    pub price: i64,
    #[serde(default = "default_true")]
    pub registration_open: bool,
    pub media_url: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Workshop {
    pub async fn create(input: &WorkshopInput, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO workshops (id, title, description, departments, lecturers, price, registration_open, media_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(WorkshopId::new())
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.departments)
        .bind(&input.lecturers)
        .bind(input.price)
        .bind(input.registration_open)
        .bind(&input.media_url)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update(id: WorkshopId, input: &WorkshopInput, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE workshops
            SET title = $2, description = $3, departments = $4, lecturers = $5,
                price = $6, registration_open = $7, media_url = $8, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.departments)
        .bind(&input.lecturers)
        .bind(input.price)
        .bind(input.registration_open)
        .bind(&input.media_url)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: WorkshopId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workshops WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(id: WorkshopId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM workshops WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM workshops ORDER BY title")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
