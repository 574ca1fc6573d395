use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::{ApiResult, AppError, EventId, WorkshopId};
use crate::domains::cart::{CartItem, CartSnapshot, CartWorkshopItem};
use crate::domains::catalog::{FestEvent, Workshop};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::member::resolve_member;

/// Every cart and combo mutation answers with the full authoritative
/// snapshot; clients replace their state wholesale.
#[derive(Serialize)]
pub struct CartEnvelope {
    pub success: bool,
    pub cart: CartSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct AddEventRequest {
    pub kinde_id: String,
    pub item: AddEventItem,
}

#[derive(Debug, Deserialize)]
pub struct AddEventItem {
    pub event_id: EventId,
}

#[derive(Debug, Deserialize)]
pub struct AddWorkshopRequest {
    pub kinde_id: String,
    pub item: AddWorkshopItem,
}

#[derive(Debug, Deserialize)]
pub struct AddWorkshopItem {
    pub workshop_id: WorkshopId,
}

pub async fn get_cart(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<CartEnvelope>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&user_id)?;

    let member = resolve_member(&user_id, &state.db_pool).await?;
    let cart = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}

pub async fn add_event_to_cart(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<AddEventRequest>,
) -> ApiResult<Json<CartEnvelope>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&body.kinde_id)?;

    let member = resolve_member(&body.kinde_id, &state.db_pool).await?;
    let event = FestEvent::find_by_id(body.item.event_id, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("event"))?;
    if !event.registration_open {
        return Err(AppError::Validation(
            "registration for this event is closed".to_string(),
        ));
    }

    // Fee is snapshotted server-side; the client never supplies a price.
    let added = CartItem::add(member.id, event.id, event.fee, &state.db_pool).await?;
    if !added {
        tracing::debug!(member_id = %member.id, event_id = %event.id, "event already in cart");
    }

    let cart = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}

pub async fn add_workshop_to_cart(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<AddWorkshopRequest>,
) -> ApiResult<Json<CartEnvelope>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&body.kinde_id)?;

    let member = resolve_member(&body.kinde_id, &state.db_pool).await?;
    let workshop = Workshop::find_by_id(body.item.workshop_id, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("workshop"))?;
    if !workshop.registration_open {
        return Err(AppError::Validation(
            "registration for this workshop is closed".to_string(),
        ));
    }

    let added =
        CartWorkshopItem::add(member.id, workshop.id, workshop.price, &state.db_pool).await?;
    if !added {
        tracing::debug!(member_id = %member.id, workshop_id = %workshop.id, "workshop already in cart");
    }

    let cart = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}

pub async fn remove_event_from_cart(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path((user_id, item_id)): Path<(String, EventId)>,
) -> ApiResult<Json<CartEnvelope>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&user_id)?;

    let member = resolve_member(&user_id, &state.db_pool).await?;
    if !CartItem::remove(member.id, item_id, &state.db_pool).await? {
        return Err(AppError::NotFound("cart item"));
    }

    // Reconciliation drops a combo the removal just invalidated.
    let cart = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}

pub async fn remove_workshop_from_cart(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path((user_id, item_id)): Path<(String, WorkshopId)>,
) -> ApiResult<Json<CartEnvelope>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&user_id)?;

    let member = resolve_member(&user_id, &state.db_pool).await?;
    if !CartWorkshopItem::remove(member.id, item_id, &state.db_pool).await? {
        return Err(AppError::NotFound("cart item"));
    }

    let cart = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}
