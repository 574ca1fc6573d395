use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::{ApiResult, AppError};
use crate::domains::cart::CartSnapshot;
use crate::domains::combo::{
    validate_selection, ActiveCombo, ComboKind, ComboPackage, SelectedCombo, CATALOG,
};
use crate::domains::member::{Affiliation, Member};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::cart::CartEnvelope;
use crate::server::routes::member::resolve_member;

#[derive(Serialize)]
pub struct ComboData {
    pub id: &'static str,
    pub kind: ComboKind,
    pub name: &'static str,
    pub price: i64,
    pub features: &'static [&'static str],
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub success: bool,
    pub combos: Vec<ComboData>,
}

#[derive(Debug, Deserialize)]
pub struct SelectComboRequest {
    pub kinde_id: String,
    pub combo_id: String,
}

#[derive(Serialize)]
pub struct ActiveComboResponse {
    pub success: bool,
    pub combo: Option<SelectedCombo>,
}

/// List the fest packages at the caller's price tier. Guests and anonymous
/// browsers see guest pricing; a synced host member sees host pricing.
pub async fn combo_catalog(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
) -> ApiResult<Json<CatalogResponse>> {
    let affiliation = match auth {
        Some(Extension(user)) => Member::find_by_kinde_id(&user.kinde_id, &state.db_pool)
            .await?
            .map(|m| m.affiliation)
            .unwrap_or(Affiliation::Guest),
        None => Affiliation::Guest,
    };

    let combos = CATALOG
        .iter()
        .map(|package| ComboData {
            id: package.id,
            kind: package.kind,
            name: package.name,
            price: package.price_for(affiliation),
            features: package.features,
        })
        .collect();

    Ok(Json(CatalogResponse {
        success: true,
        combos,
    }))
}

/// Select a package. The selection is validated against the current cart
/// and the price locked from the member's verified affiliation.
pub async fn select_combo(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<SelectComboRequest>,
) -> ApiResult<Json<CartEnvelope>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&body.kinde_id)?;

    let member = resolve_member(&body.kinde_id, &state.db_pool).await?;
    let package =
        ComboPackage::find(&body.combo_id).ok_or(AppError::NotFound("package"))?;

    let snapshot = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    validate_selection(package.kind, snapshot.events.len(), snapshot.workshops.len())
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let price = package.price_for(member.affiliation);
    ActiveCombo::select(member.id, package.id, price, &state.db_pool).await?;
    tracing::info!(member_id = %member.id, combo_id = package.id, price, "combo selected");

    let cart = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}

pub async fn clear_combo(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<CartEnvelope>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&user_id)?;

    let member = resolve_member(&user_id, &state.db_pool).await?;
    ActiveCombo::clear(member.id, &state.db_pool).await?;

    let cart = CartSnapshot::load_reconciled(member.id, &state.db_pool).await?;
    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}

pub async fn active_combo(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ActiveComboResponse>> {
    let auth = AuthUser::require(auth)?;
    auth.authorize_for(&user_id)?;

    let member = resolve_member(&user_id, &state.db_pool).await?;
    let combo = ActiveCombo::find_for_member(member.id, &state.db_pool)
        .await?
        .and_then(|row| row.as_selected());

    Ok(Json(ActiveComboResponse {
        success: true,
        combo,
    }))
}
