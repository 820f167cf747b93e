mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use common::{body_json, full_week, TestApp};
use konnect_backend::domain::ports::CancelOutcome;
use serde_json::json;
use sqlx::Row;
use std::sync::atomic::Ordering;

fn tomorrow_at(hour: u32) -> DateTime<Utc> {
    (Utc::now() + Duration::days(1))
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
}

/// Books and pays for a slot; returns the reservation id.
async fn setup_paid_booking(app: &TestApp, mentor: &str, mentee: &str) -> String {
    let res = app
        .post(
            "/api/v1/programs",
            mentor,
            json!({
                "title": "Career Coaching",
                "description": "Resume and interviews",
                "price": 50000,
                "duration_min": 60,
                "available_schedule": full_week("09:00", "18:00"),
            }),
        )
        .await;
    let program_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = app
        .post(
            "/api/v1/reservations",
            mentee,
            json!({
                "program_id": program_id,
                "start_time": tomorrow_at(10).to_rfc3339(),
                "end_time": tomorrow_at(11).to_rfc3339(),
                "phone": "010-0000-0000",
                "email": "mentee@example.com",
                "message": "please review my resume",
            }),
        )
        .await;
    let body = body_json(res).await;
    let reservation_id = body["reservation_id"].as_str().unwrap().to_string();
    let order_id = body["order_id"].as_str().unwrap().to_string();

    let res = app
        .post(
            "/api/v1/payments/verify",
            mentee,
            json!({ "order_id": order_id, "price": 50000, "payment_key": "pk_paid" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    reservation_id
}

async fn decide(app: &TestApp, mentor: &str, reservation_id: &str, approved: bool) -> axum::response::Response {
    app.post(
        &format!("/api/v1/reservations/{}/decision", reservation_id),
        mentor,
        json!({ "approved": approved, "reason": if approved { None } else { Some("Schedule conflict") } }),
    )
    .await
}

async fn reservation_row(app: &TestApp, id: &str) -> (String, Option<String>) {
    let row = sqlx::query("SELECT status, reason FROM reservations WHERE id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    (row.get("status"), row.get("reason"))
}

#[tokio::test]
async fn test_mentor_approval_moves_reservation_to_progress() {
    let app = TestApp::new().await;
    let reservation_id = setup_paid_booking(&app, "mentor-1", "mentee-1").await;

    let res = decide(&app, "mentor-1", &reservation_id, true).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "approved");

    let (status, _) = reservation_row(&app, &reservation_id).await;
    assert_eq!(status, "PROGRESS");
}

#[tokio::test]
async fn test_mentor_rejection_refunds_the_mentee() {
    let app = TestApp::new().await;
    let reservation_id = setup_paid_booking(&app, "mentor-1", "mentee-1").await;

    let res = decide(&app, "mentor-1", &reservation_id, false).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "rejected");

    let (status, reason) = reservation_row(&app, &reservation_id).await;
    assert_eq!(status, "CANCELLED");
    assert_eq!(reason.as_deref(), Some("Schedule conflict"));

    let pay_status: String = sqlx::query("SELECT status FROM payments WHERE reservation_id = ?")
        .bind(&reservation_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get("status");
    assert_eq!(pay_status, "REFUNDED");
    assert_eq!(app.gateway.cancel_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejection_aborts_when_gateway_refuses_refund() {
    let app = TestApp::new().await;
    let reservation_id = setup_paid_booking(&app, "mentor-1", "mentee-1").await;

    app.gateway.push_cancel(CancelOutcome::Rejected {
        code: "NOT_CANCELABLE".to_string(),
        message: "settlement already ran".to_string(),
    });

    let res = decide(&app, "mentor-1", &reservation_id, false).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The booking stays paid and decidable.
    let (status, _) = reservation_row(&app, &reservation_id).await;
    assert_eq!(status, "CONFIRMED");
}

#[tokio::test]
async fn test_only_the_owning_mentor_may_decide() {
    let app = TestApp::new().await;
    let reservation_id = setup_paid_booking(&app, "mentor-1", "mentee-1").await;

    let res = decide(&app, "mentor-2", &reservation_id, true).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let (status, _) = reservation_row(&app, &reservation_id).await;
    assert_eq!(status, "CONFIRMED");
}

#[tokio::test]
async fn test_unpaid_reservation_cannot_be_decided() {
    let app = TestApp::new().await;
    let res = app
        .post(
            "/api/v1/programs",
            "mentor-1",
            json!({
                "title": "Career Coaching",
                "description": "Resume and interviews",
                "price": 50000,
                "duration_min": 60,
                "available_schedule": full_week("09:00", "18:00"),
            }),
        )
        .await;
    let program_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = app
        .post(
            "/api/v1/reservations",
            "mentee-1",
            json!({
                "program_id": program_id,
                "start_time": tomorrow_at(10).to_rfc3339(),
                "end_time": tomorrow_at(11).to_rfc3339(),
                "phone": "010-0000-0000",
                "email": "mentee@example.com",
                "message": "hi",
            }),
        )
        .await;
    let reservation_id = body_json(res).await["reservation_id"].as_str().unwrap().to_string();

    // Still PENDING, nothing to decide on.
    let res = decide(&app, "mentor-1", &reservation_id, true).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_decision_is_not_repeatable() {
    let app = TestApp::new().await;
    let reservation_id = setup_paid_booking(&app, "mentor-1", "mentee-1").await;

    let res = decide(&app, "mentor-1", &reservation_id, true).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = decide(&app, "mentor-1", &reservation_id, false).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let (status, _) = reservation_row(&app, &reservation_id).await;
    assert_eq!(status, "PROGRESS");
}
