use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::{MemberId, OrderId};

/// Payment order lifecycle:
/// pending -> redirected -> completed | failed.
/// Terminal states are never left; all updates are additionally guarded in
/// SQL so concurrent verifications cannot double-settle an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Redirected,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Redirected => "redirected",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }

    pub fn can_transition(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Redirected) | (Pending, Failed) | (Redirected, Completed) | (Redirected, Failed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentOrder {
    pub id: OrderId,
    /// Merchant transaction id handed to the gateway and echoed back on the
    /// return redirect.
    pub txn_id: String,
    pub member_id: MemberId,
    pub combo_id: String,
    /// Charged amount in whole rupees; always the combo price.
    pub amount: i64,
    /// Gateway hash inputs captured at initiate. The response hash covers
    /// the values submitted with the checkout form, so verification must
    /// use these, never the member row (which may have re-synced since).
    pub firstname: String,
    pub email: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentOrder {
    pub async fn create(
        member_id: MemberId,
        combo_id: &str,
        amount: i64,
        firstname: &str,
        email: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let txn_id = format!("FEST-{}", Uuid::new_v4().simple());
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO payment_orders (id, txn_id, member_id, combo_id, amount, firstname, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(OrderId::new())
        .bind(&txn_id)
        .bind(member_id)
        .bind(combo_id)
        .bind(amount)
        .bind(firstname)
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_txn_id(txn_id: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM payment_orders WHERE txn_id = $1")
            .bind(txn_id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Record the hand-off to the gateway. Guarded: only a pending order
    /// can move here.
    pub async fn mark_redirected(id: OrderId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE payment_orders
            SET status = 'redirected', updated_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Mark a non-terminal order failed. Returns false when the order had
    /// already settled.
    pub async fn mark_failed(id: OrderId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_orders
            SET status = 'failed', updated_at = now()
            WHERE id = $1 AND status IN ('pending', 'redirected')
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Settle a confirmed payment: complete the order and empty the
    /// member's cart and combo in one transaction. Returns false when the
    /// order was not in a completable state (already settled elsewhere).
    pub async fn complete_and_clear_cart(
        id: OrderId,
        member_id: MemberId,
        pool: &PgPool,
    ) -> Result<bool> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE payment_orders
            SET status = 'completed', updated_at = now()
            WHERE id = $1 AND status = 'redirected'
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM cart_items WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM cart_workshops WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM active_combos WHERE member_id = $1")
            .bind(member_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn lifecycle_transitions() {
        assert!(Pending.can_transition(Redirected));
        assert!(Pending.can_transition(Failed));
        assert!(Redirected.can_transition(Completed));
        assert!(Redirected.can_transition(Failed));
    }

    #[test]
    fn terminal_states_are_sticky() {
        for terminal in [Completed, Failed] {
            assert!(terminal.is_terminal());
            for next in [Pending, Redirected, Completed, Failed] {
                assert!(!terminal.can_transition(next));
            }
        }
    }

    #[test]
    fn no_shortcut_from_pending_to_completed() {
        assert!(!Pending.can_transition(Completed));
    }
}
