use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Payment amount mismatch")]
    AmountMismatch,
    #[error("Payment was not completed by the provider")]
    PaymentNotCompleted,
    #[error("Payment confirmation failed: {0}")]
    PaymentConfirmFailed(String),
    #[error("Refund was rejected by the provider")]
    RefundFailed,
    #[error("Session already completed, refund is not possible")]
    AlreadyCompleted,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    // The partial slot index funnels double-booking races
                    // here, so this is a client-correctable conflict.
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Slot already booked" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::AmountMismatch => (StatusCode::BAD_REQUEST, "Payment amount does not match the order".to_string()),
            AppError::PaymentNotCompleted => (StatusCode::BAD_REQUEST, "Payment was not completed".to_string()),
            AppError::PaymentConfirmFailed(msg) => (StatusCode::BAD_REQUEST, format!("Payment confirmation failed: {}", msg)),
            AppError::RefundFailed => (StatusCode::BAD_REQUEST, "Refund was rejected".to_string()),
            AppError::AlreadyCompleted => (StatusCode::BAD_REQUEST, "Completed sessions cannot be refunded".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
