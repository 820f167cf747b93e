use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{CreateReservationRequest, DecisionRequest, PaginationQuery};
use crate::api::dtos::responses::BookingReceiptResponse;
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::reservation_service::CreateReservation;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state
        .reservation_service
        .create(CreateReservation {
            program_id: payload.program_id,
            user_id,
            start_time: payload.start_time,
            end_time: payload.end_time,
            phone: payload.phone,
            email: payload.email,
            message: payload.message,
        })
        .await?;

    Ok(Json(BookingReceiptResponse {
        reservation_id: receipt.reservation_id,
        order_id: receipt.order_id,
        amount: receipt.amount,
        order_name: receipt.order_name,
    }))
}

pub async fn list_my_reservations(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = pagination.limit_offset();
    let items = state
        .reservation_repo
        .list_for_user(&user_id, limit, offset)
        .await?;
    Ok(Json(serde_json::json!({ "items": items })))
}

pub async fn decide_reservation(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(reservation_id): Path<String>,
    Json(payload): Json<DecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .reservation_service
        .decide(&user_id, &reservation_id, payload.approved, payload.reason)
        .await?;

    let status = if payload.approved { "approved" } else { "rejected" };
    Ok(Json(serde_json::json!({ "status": status })))
}
