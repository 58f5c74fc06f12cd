use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{post, put};
use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::error::AppError;
use crate::models::*;
use crate::services::BackfillStats;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/classes", get(list_classes).post(create_class))
        .route("/classes/backfill", post(backfill_legacy))
        .route("/classes/{id}", put(upsert_class))
        .route("/classes/{id}/status", put(update_status))
        .route("/classes/{id}/schedule", put(place_class).delete(unassign_class))
        .route("/classes/{id}/events", get(list_events))
        .route("/classes/{id}/events/regenerate", post(regenerate_events))
        .route("/teachers/{id}/conflicts", get(teacher_conflicts))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_classes(State(state): State<AppState>) -> Result<Json<Vec<Class>>, AppError> {
    let classes = state.scheduling().list_classes().await?;
    Ok(Json(classes))
}

async fn create_class(
    State(state): State<AppState>,
    Json(req): Json<NewClassRequest>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class = state.scheduling().create_class(req).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

async fn upsert_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(class): Json<Class>,
) -> Result<Json<Class>, AppError> {
    if class.id != id {
        return Err(AppError::BadRequest(format!(
            "class id {} does not match path {}",
            class.id, id
        )));
    }
    let class = state.scheduling().upsert_class(class).await?;
    Ok(Json(class))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Class>, AppError> {
    let class = state.scheduling().set_status(&id, req.status).await?;
    Ok(Json(class))
}

async fn place_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PlaceClassRequest>,
) -> Result<Json<Class>, AppError> {
    let placement = GridPlacement {
        block: req.block,
        pattern: req.pattern,
    };
    let class = state
        .scheduling()
        .place_class(&id, placement, req.version)
        .await?;
    Ok(Json(class))
}

async fn unassign_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(req): Query<UnassignClassRequest>,
) -> Result<Json<Class>, AppError> {
    let class = state.scheduling().unassign_class(&id, req.version).await?;
    Ok(Json(class))
}

async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    let events = state.scheduling().list_events(&id).await?;
    Ok(Json(events))
}

async fn regenerate_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CalendarEvent>>, AppError> {
    let events = state.scheduling().regenerate_events_for(&id).await?;
    Ok(Json(events))
}

async fn teacher_conflicts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ConflictAlert>>, AppError> {
    let alerts = state.scheduling().teacher_conflicts(&id).await?;
    Ok(Json(alerts))
}

async fn backfill_legacy(State(state): State<AppState>) -> Result<Json<BackfillStats>, AppError> {
    let stats = state.scheduling().backfill_legacy().await?;
    Ok(Json(stats))
}
