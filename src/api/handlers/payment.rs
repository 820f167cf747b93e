use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{PaginationQuery, VerifyPaymentRequest};
use crate::api::dtos::responses::VerifyPaymentResponse;
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::payment_service::VerifyOutcome;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .payment_service
        .verify(&payload.order_id, payload.price, &payload.payment_key)
        .await?;

    let response = match outcome {
        VerifyOutcome::Done { receipt_url } => VerifyPaymentResponse {
            status: "done",
            receipt_url,
            should_retry: None,
        },
        VerifyOutcome::Pending { should_retry } => VerifyPaymentResponse {
            status: "pending",
            receipt_url: None,
            should_retry: Some(should_retry),
        },
    };
    Ok(Json(response))
}

pub async fn cancel_payment(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(payment_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .payment_service
        .cancel_and_refund(&user_id, &payment_key)
        .await?;
    Ok(Json(serde_json::json!({ "status": "refunded" })))
}

pub async fn list_my_payments(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (limit, offset) = pagination.limit_offset();
    let items = state.payment_repo.list_for_user(&user_id, limit, offset).await?;
    Ok(Json(serde_json::json!({ "items": items })))
}
