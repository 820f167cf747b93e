use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::CreateProgramRequest;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::program::Program;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn create_program(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateProgramRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.price < 0 {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    if payload.duration_min <= 0 {
        return Err(AppError::Validation("duration_min must be positive".into()));
    }

    let program = Program::new(
        user_id,
        payload.title,
        payload.description,
        payload.price,
        payload.duration_min,
    );

    let created = state
        .program_repo
        .create_with_schedule(&program, &payload.available_schedule)
        .await?;

    info!(program_id = %created.id, "program created");
    Ok(Json(created))
}

pub async fn get_program(
    State(state): State<Arc<AppState>>,
    Path(program_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let program = state
        .program_repo
        .find_by_id(&program_id)
        .await?
        .ok_or(AppError::NotFound("Program not found".into()))?;

    let schedule = state.program_repo.find_schedule(&program.id).await?;

    Ok(Json(serde_json::json!({
        "program": program,
        "available_schedule": schedule.map(|s| s.weekly),
    })))
}

pub async fn delete_program(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(program_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.program_repo.delete(&user_id, &program_id).await?;
    info!(%program_id, "program deleted");
    Ok(Json(serde_json::json!({ "status": "deleted" })))
}
