use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::{Extension, Path},
    Json,
};
use payu::{CallbackParams, PaymentRequest};
use serde::{Deserialize, Serialize};

use crate::common::{ApiResult, AppError};
use crate::domains::payment::{
    confirm_with_gateway, Confirmation, OrderStatus, PaymentOrder, VerifyRetryPolicy,
};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::member::resolve_member;

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub kinde_id: String,
}

/// Everything the client needs to hand the browser to the gateway.
#[derive(Serialize)]
pub struct SessionData {
    pub order_id: String,
    pub amount: i64,
    pub action: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Serialize)]
pub struct InitiateResponse {
    pub success: bool,
    pub session_data: SessionData,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: &'static str,
}

#[derive(Debug, Deserialize, Default)]
pub struct VerifyPaymentRequest {
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub signature: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyResponse {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            status: "failed",
            error: Some(reason.into()),
        }
    }
}

/// Start checkout for the member's active combo.
///
/// The charged amount is always the combo price; item fees never sum into
/// it. The order row is created, the gateway form is signed, and the order
/// moves to `redirected`.
pub async fn initiate_payment(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<InitiatePaymentRequest>,
) -> ApiResult<Json<InitiateResponse>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&body.kinde_id)?;

    let member = resolve_member(&body.kinde_id, &state.db_pool).await?;

    // load_reconciled guarantees any combo it returns passes its rules.
    let snapshot =
        crate::domains::cart::CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    let combo = snapshot.active_combo.ok_or_else(|| {
        AppError::Validation("select a package before starting payment".to_string())
    })?;

    // The gateway's response hash covers exactly what goes into this form,
    // so the name and email are snapshotted on the order for verification.
    let order = PaymentOrder::create(
        member.id,
        &combo.id,
        combo.price,
        member.first_name(),
        &member.email,
        &state.db_pool,
    )
    .await?;

    let return_url = format!("{}/payment/return", state.config.payment_return_url);
    let prepared = state.payu.payment_request(&PaymentRequest {
        txnid: order.txn_id.clone(),
        amount: order.amount,
        productinfo: order.combo_id.clone(),
        firstname: order.firstname.clone(),
        email: order.email.clone(),
        surl: return_url.clone(),
        furl: return_url,
    });

    let order = PaymentOrder::mark_redirected(order.id, &state.db_pool)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow!("freshly created order was not pending")))?;

    tracing::info!(
        txn_id = %order.txn_id,
        member_id = %member.id,
        amount = order.amount,
        combo_id = %order.combo_id,
        "payment initiated"
    );

    Ok(Json(InitiateResponse {
        success: true,
        session_data: SessionData {
            order_id: order.txn_id,
            amount: order.amount,
            action: prepared.action,
            fields: prepared.fields,
        },
    }))
}

pub async fn payment_status(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let auth = AuthUser::require(auth)?;

    let order = PaymentOrder::find_by_txn_id(&order_id, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("order"))?;

    if !auth.is_admin {
        let member = resolve_member(&auth.kinde_id, &state.db_pool).await?;
        if order.member_id != member.id {
            return Err(AppError::Forbidden);
        }
    }

    Ok(Json(StatusResponse {
        success: true,
        status: order.status.as_str(),
    }))
}

/// Settle an order after the gateway redirected the browser back.
///
/// Missing parameters fail immediately with no lookup anywhere. A good
/// signature still only counts once the gateway's status API confirms the
/// payment; confirmation polls with bounded retries. An unconfirmed order
/// is left re-verifiable rather than moved to a terminal state.
pub async fn verify_payment(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<VerifyPaymentRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let auth = AuthUser::require(auth)?;

    let (order_id, status, signature) = match (
        non_empty(body.order_id),
        non_empty(body.status),
        non_empty(body.signature),
    ) {
        (Some(o), Some(s), Some(h)) => (o, s, h),
        _ => {
            tracing::warn!("payment verify called with missing parameters");
            return Ok(Json(VerifyResponse::failed(
                "missing order_id, status or signature",
            )));
        }
    };

    let order = PaymentOrder::find_by_txn_id(&order_id, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("order"))?;

    let member = crate::domains::member::Member::find_by_id(order.member_id, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("member"))?;
    if !auth.is_admin && member.kinde_id != auth.kinde_id {
        return Err(AppError::Forbidden);
    }

    // Re-verifying a settled order is idempotent.
    if order.status == OrderStatus::Completed {
        return Ok(Json(VerifyResponse {
            success: true,
            status: "completed",
            error: None,
        }));
    }
    if !order.status.can_transition(OrderStatus::Completed) {
        return Ok(Json(VerifyResponse::failed(format!(
            "order is {} and cannot be verified",
            order.status.as_str()
        ))));
    }

    // The hash is reconstructed from the order's initiate-time snapshot,
    // not the member row; a profile re-sync between initiate and verify
    // must not break a genuine callback.
    let params = CallbackParams {
        txnid: order.txn_id.clone(),
        status: status.clone(),
        amount: order.amount,
        productinfo: order.combo_id.clone(),
        firstname: order.firstname.clone(),
        email: order.email.clone(),
        hash: signature,
    };
    if !state.payu.verify_response_hash(&params) {
        tracing::warn!(txn_id = %order.txn_id, "payment callback signature mismatch");
        fail_order(&order, &state).await?;
        return Ok(Json(VerifyResponse::failed("signature verification failed")));
    }

    if status != "success" {
        fail_order(&order, &state).await?;
        return Ok(Json(VerifyResponse::failed("payment was not successful")));
    }

    let policy = VerifyRetryPolicy {
        attempts: state.config.verify_poll_attempts,
        delay: Duration::from_millis(state.config.verify_poll_delay_ms),
    };
    match confirm_with_gateway(&state.payu, &order.txn_id, policy).await {
        Confirmation::Confirmed => {
            let settled =
                PaymentOrder::complete_and_clear_cart(order.id, order.member_id, &state.db_pool)
                    .await?;
            if !settled {
                // Lost a race with a concurrent verification that already
                // completed this order; the outcome is the same.
                tracing::debug!(txn_id = %order.txn_id, "order already settled");
            }
            tracing::info!(txn_id = %order.txn_id, "payment confirmed, cart cleared");
            Ok(Json(VerifyResponse {
                success: true,
                status: "completed",
                error: None,
            }))
        }
        Confirmation::Declined => {
            fail_order(&order, &state).await?;
            Ok(Json(VerifyResponse::failed("payment declined by gateway")))
        }
        Confirmation::Unconfirmed => Ok(Json(VerifyResponse {
            success: false,
            status: "pending",
            error: Some("could not confirm the payment yet; try again".to_string()),
        })),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fail an order, tolerating a concurrent verification that settled it
/// first; the guarded UPDATE reports that as false.
async fn fail_order(order: &PaymentOrder, state: &AppState) -> Result<(), AppError> {
    if !PaymentOrder::mark_failed(order.id, &state.db_pool).await? {
        tracing::debug!(txn_id = %order.txn_id, "order already settled, not marking failed");
    }
    Ok(())
}
