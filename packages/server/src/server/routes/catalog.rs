use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::Serialize;

use crate::common::{ApiResult, AppError, EventId, WorkshopId};
use crate::domains::catalog::{EventInput, FestEvent, Workshop, WorkshopInput};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

#[derive(Serialize)]
pub struct EventsResponse {
    pub success: bool,
    pub events: Vec<FestEvent>,
}

#[derive(Serialize)]
pub struct EventResponse {
    pub success: bool,
    pub event: FestEvent,
}

#[derive(Serialize)]
pub struct WorkshopsResponse {
    pub success: bool,
    pub workshops: Vec<Workshop>,
}

#[derive(Serialize)]
pub struct WorkshopResponse {
    pub success: bool,
    pub workshop: Workshop,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

pub async fn list_events(Extension(state): Extension<AppState>) -> ApiResult<Json<EventsResponse>> {
    let events = FestEvent::list(&state.db_pool).await?;
    Ok(Json(EventsResponse {
        success: true,
        events,
    }))
}

pub async fn get_event(
    Extension(state): Extension<AppState>,
    Path(id): Path<EventId>,
) -> ApiResult<Json<EventResponse>> {
    let event = FestEvent::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("event"))?;
    Ok(Json(EventResponse {
        success: true,
        event,
    }))
}

pub async fn create_event(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(input): Json<EventInput>,
) -> ApiResult<Json<EventResponse>> {
    AuthUser::require(auth)?.require_admin()?;
    let event = FestEvent::create(&input, &state.db_pool).await?;
    tracing::info!(event_id = %event.id, title = %event.title, "event created");
    Ok(Json(EventResponse {
        success: true,
        event,
    }))
}

pub async fn update_event(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<EventId>,
    Json(input): Json<EventInput>,
) -> ApiResult<Json<EventResponse>> {
    AuthUser::require(auth)?.require_admin()?;
    let event = FestEvent::update(id, &input, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("event"))?;
    Ok(Json(EventResponse {
        success: true,
        event,
    }))
}

pub async fn delete_event(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<EventId>,
) -> ApiResult<Json<DeletedResponse>> {
    AuthUser::require(auth)?.require_admin()?;
    if !FestEvent::delete(id, &state.db_pool).await? {
        return Err(AppError::NotFound("event"));
    }
    Ok(Json(DeletedResponse { success: true }))
}

// ---------------------------------------------------------------------------
// Workshops
// ---------------------------------------------------------------------------

pub async fn list_workshops(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<WorkshopsResponse>> {
    let workshops = Workshop::list(&state.db_pool).await?;
    Ok(Json(WorkshopsResponse {
        success: true,
        workshops,
    }))
}

pub async fn get_workshop(
    Extension(state): Extension<AppState>,
    Path(id): Path<WorkshopId>,
) -> ApiResult<Json<WorkshopResponse>> {
    let workshop = Workshop::find_by_id(id, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("workshop"))?;
    Ok(Json(WorkshopResponse {
        success: true,
        workshop,
    }))
}

pub async fn create_workshop(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(input): Json<WorkshopInput>,
) -> ApiResult<Json<WorkshopResponse>> {
    AuthUser::require(auth)?.require_admin()?;
    let workshop = Workshop::create(&input, &state.db_pool).await?;
    tracing::info!(workshop_id = %workshop.id, title = %workshop.title, "workshop created");
    Ok(Json(WorkshopResponse {
        success: true,
        workshop,
    }))
}

pub async fn update_workshop(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<WorkshopId>,
    Json(input): Json<WorkshopInput>,
) -> ApiResult<Json<WorkshopResponse>> {
    AuthUser::require(auth)?.require_admin()?;
    let workshop = Workshop::update(id, &input, &state.db_pool)
        .await?
        .ok_or(AppError::NotFound("workshop"))?;
    Ok(Json(WorkshopResponse {
        success: true,
        workshop,
    }))
}

pub async fn delete_workshop(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<WorkshopId>,
) -> ApiResult<Json<DeletedResponse>> {
    AuthUser::require(auth)?.require_admin()?;
    if !Workshop::delete(id, &state.db_pool).await? {
        return Err(AppError::NotFound("workshop"));
    }
    Ok(Json(DeletedResponse { success: true }))
}
