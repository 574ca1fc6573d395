use anyhow::Result;
use sqlx::PgPool;

use crate::common::{EventId, MemberId, WorkshopId};
use crate::domains::cart::state::{CartEventEntry, CartSnapshot, CartWorkshopEntry};
use crate::domains::combo::ActiveCombo;

/// Persistence for cart event lines. Uniqueness is the table's composite
/// primary key; adds are idempotent.
pub struct CartItem;

/// Persistence for cart workshop lines.
pub struct CartWorkshopItem;

impl CartItem {
    /// Idempotent add. Returns false when the event was already in the cart.
    pub async fn add(
        member_id: MemberId,
        event_id: EventId,
        fee: i64,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO cart_items (member_id, event_id, fee)
            VALUES ($1, $2, $3)
            ON CONFLICT (member_id, event_id) DO NOTHING
            "#,
        )
        .bind(member_id)
        .bind(event_id)
        .bind(fee)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(member_id: MemberId, event_id: EventId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE member_id = $1 AND event_id = $2")
            .bind(member_id)
            .bind(event_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl CartWorkshopItem {
    /// Idempotent add. Returns false when the workshop was already in the cart.
    pub async fn add(
        member_id: MemberId,
        workshop_id: WorkshopId,
        price: i64,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO cart_workshops (member_id, workshop_id, price)
            VALUES ($1, $2, $3)
            ON CONFLICT (member_id, workshop_id) DO NOTHING
            "#,
        )
        .bind(member_id)
        .bind(workshop_id)
        .bind(price)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(
        member_id: MemberId,
        workshop_id: WorkshopId,
        pool: &PgPool,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM cart_workshops WHERE member_id = $1 AND workshop_id = $2")
                .bind(member_id)
                .bind(workshop_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl CartSnapshot {
    /// Load a member's full snapshot: cart lines joined against the catalog
    /// for display fields, plus the active combo resolved against the
    /// in-code package catalog.
    pub async fn load(member_id: MemberId, pool: &PgPool) -> Result<Self> {
        let events = sqlx::query_as::<_, CartEventEntry>(
            r#"
            SELECT ci.event_id, e.title, e.tag, e.department, ci.fee
            FROM cart_items ci
            INNER JOIN events e ON e.id = ci.event_id
            WHERE ci.member_id = $1
            ORDER BY ci.added_at
            "#,
        )
        .bind(member_id)
        .fetch_all(pool)
        .await?;

        let workshops = sqlx::query_as::<_, CartWorkshopEntry>(
            r#"
            SELECT cw.workshop_id, w.title, cw.price
            FROM cart_workshops cw
            INNER JOIN workshops w ON w.id = cw.workshop_id
            WHERE cw.member_id = $1
            ORDER BY cw.added_at
            "#,
        )
        .bind(member_id)
        .fetch_all(pool)
        .await?;

        let active_combo = ActiveCombo::find_for_member(member_id, pool)
            .await?
            .and_then(|row| row.as_selected());

        Ok(Self {
            events,
            workshops,
            active_combo,
        })
    }

    /// Load a snapshot and enforce the combo invariant against the
    /// database: a combo invalidated by the current contents is deleted
    /// before the snapshot is returned.
    pub async fn load_reconciled(member_id: MemberId, pool: &PgPool) -> Result<Self> {
        let mut snapshot = Self::load(member_id, pool).await?;
        if snapshot.revalidate_combo() {
            tracing::debug!(%member_id, "active combo no longer valid, clearing");
            ActiveCombo::clear(member_id, pool).await?;
        }
        Ok(snapshot)
    }
}
