use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ApiResult, AppError};
use crate::domains::member::{Affiliation, Member};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct SyncMemberRequest {
    pub kinde_id: String,
    pub full_name: String,
}

#[derive(Serialize)]
pub struct MemberResponse {
    pub success: bool,
    pub member: Member,
}

/// Resolve the member row behind an external identity id, for handlers that
/// operate on a path or body `user_id`.
pub(crate) async fn resolve_member(kinde_id: &str, pool: &PgPool) -> Result<Member, AppError> {
    Member::find_by_kinde_id(kinde_id, pool)
        .await?
        .ok_or(AppError::NotFound("member"))
}

/// Create or refresh the member row from the identity provider's profile.
///
/// The affiliation is recomputed here, from the token's verified email and
/// the configured host domains - never from anything the client sends.
pub async fn sync_member(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(body): Json<SyncMemberRequest>,
) -> ApiResult<Json<MemberResponse>> {
    let auth = AuthUser::require(auth)?;
    if auth.kinde_id != body.kinde_id {
        return Err(AppError::Forbidden);
    }

    let affiliation =
        Affiliation::from_email_domain(&auth.email, &state.config.host_email_domains);
    let member = Member::upsert_from_identity(
        &body.kinde_id,
        &auth.email,
        &body.full_name,
        affiliation,
        &state.db_pool,
    )
    .await?;

    Ok(Json(MemberResponse {
        success: true,
        member,
    }))
}

pub async fn current_member(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
) -> ApiResult<Json<MemberResponse>> {
    let auth = AuthUser::require(auth)?;
    let member = resolve_member(&auth.kinde_id, &state.db_pool).await?;
    Ok(Json(MemberResponse {
        success: true,
        member,
    }))
}
