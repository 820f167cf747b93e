use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::api::handlers::{health, payment, program, reservation};
use crate::state::AppState;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Mentoring programs
        .route("/api/v1/programs", post(program::create_program))
        .route("/api/v1/programs/{program_id}", get(program::get_program))
        .route("/api/v1/programs/{program_id}", delete(program::delete_program))

        // Reservations
        .route("/api/v1/reservations", post(reservation::create_reservation).get(reservation::list_my_reservations))
        .route("/api/v1/reservations/{reservation_id}/decision", post(reservation::decide_reservation))

        // Payments
        .route("/api/v1/payments/verify", post(payment::verify_payment))
        .route("/api/v1/payments/{payment_key}/cancel", post(payment::cancel_payment))
        .route("/api/v1/payments", get(payment::list_my_payments))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
