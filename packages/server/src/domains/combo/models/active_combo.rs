use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::MemberId;
use crate::domains::combo::catalog::{ComboPackage, SelectedCombo};

/// A member's persisted package selection. At most one row per member.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActiveCombo {
    pub member_id: MemberId,
    pub combo_id: String,
    pub price: i64,
    pub selected_at: DateTime<Utc>,
}

impl ActiveCombo {
    /// Select a package, replacing any previous selection.
    pub async fn select(
        member_id: MemberId,
        combo_id: &str,
        price: i64,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO active_combos (member_id, combo_id, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (member_id) DO UPDATE
            SET combo_id = EXCLUDED.combo_id,
                price = EXCLUDED.price,
                selected_at = now()
            RETURNING *
            "#,
        )
        .bind(member_id)
        .bind(combo_id)
        .bind(price)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn clear(member_id: MemberId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM active_combos WHERE member_id = $1")
            .bind(member_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn find_for_member(member_id: MemberId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM active_combos WHERE member_id = $1")
            .bind(member_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Resolve the stored slug against the in-code catalog. A selection
    /// whose package no longer exists resolves to `None` and gets swept by
    /// the cart revalidation pass.
    pub fn as_selected(&self) -> Option<SelectedCombo> {
        ComboPackage::find(&self.combo_id).map(|package| SelectedCombo {
            id: self.combo_id.clone(),
            kind: package.kind,
            name: package.name.to_string(),
            price: self.price,
        })
    }
}
