mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use common::{body_json, full_week, TestApp};
use konnect_backend::background::{dispatch_outbox, run_sweep};
use serde_json::json;
use sqlx::Row;

fn tomorrow_at(hour: u32) -> DateTime<Utc> {
    (Utc::now() + Duration::days(1))
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_utc()
}

async fn setup_booking(app: &TestApp) -> (String, String) {
    let res = app
        .post(
            "/api/v1/programs",
            "mentor-1",
            json!({
                "title": "Code Review",
                "description": "PR walkthroughs",
                "price": 20000,
                "duration_min": 60,
                "available_schedule": full_week("00:00", "23:59"),
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
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    (
        body["reservation_id"].as_str().unwrap().to_string(),
        body["order_id"].as_str().unwrap().to_string(),
    )
}

async fn outbox_rows(app: &TestApp) -> Vec<(String, String)> {
    sqlx::query("SELECT event_type, status FROM outbox_events ORDER BY created_at")
        .fetch_all(&app.pool)
        .await
        .unwrap()
        .into_iter()
        .map(|row| (row.get("event_type"), row.get("status")))
        .collect()
}

#[tokio::test]
async fn test_booking_enqueues_a_notification_event() {
    let app = TestApp::new().await;
    setup_booking(&app).await;

    let rows = outbox_rows(&app).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], ("BOOKING_CREATED".to_string(), "PENDING".to_string()));
}

#[tokio::test]
async fn test_dispatch_delivers_and_marks_sent() {
    let app = TestApp::new().await;
    setup_booking(&app).await;

    dispatch_outbox(&app.state).await;

    let rows = outbox_rows(&app).await;
    assert_eq!(rows[0].1, "SENT");
    assert_eq!(
        *app.notifier.delivered.lock().unwrap(),
        vec!["BOOKING_CREATED".to_string()]
    );

    // A second pass finds nothing to deliver.
    dispatch_outbox(&app.state).await;
    assert_eq!(app.notifier.delivered.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_delivery_is_recorded_not_retried_inline() {
    let app = TestApp::new().await;
    setup_booking(&app).await;

    *app.notifier.fail.lock().unwrap() = true;
    dispatch_outbox(&app.state).await;

    let row = sqlx::query("SELECT status, error_message FROM outbox_events")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("status"), "FAILED");
    assert!(row
        .get::<Option<String>, _>("error_message")
        .unwrap()
        .contains("push service unavailable"));
}

#[tokio::test]
async fn test_sweep_purges_expired_pending_reservations() {
    let app = TestApp::new().await;
    let (reservation_id, _) = setup_booking(&app).await;

    sqlx::query("UPDATE reservations SET expire = ? WHERE id = ?")
        .bind(Utc::now() - Duration::minutes(1))
        .bind(&reservation_id)
        .execute(&app.pool)
        .await
        .unwrap();

    run_sweep(&app.state).await;

    let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM reservations")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get("count");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_sweep_leaves_live_holds_alone() {
    let app = TestApp::new().await;
    setup_booking(&app).await;

    run_sweep(&app.state).await;

    let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM reservations")
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_sweep_completes_elapsed_sessions() {
    let app = TestApp::new().await;
    let (reservation_id, order_id) = setup_booking(&app).await;

    let res = app
        .post(
            "/api/v1/payments/verify",
            "mentee-1",
            json!({ "order_id": order_id, "price": 20000, "payment_key": "pk_bg" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Approve and backdate the session to the past.
    sqlx::query("UPDATE reservations SET status = 'PROGRESS', start_time = ?, end_time = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(2))
        .bind(Utc::now() - Duration::hours(1))
        .bind(&reservation_id)
        .execute(&app.pool)
        .await
        .unwrap();

    run_sweep(&app.state).await;

    let status: String = sqlx::query("SELECT status FROM reservations WHERE id = ?")
        .bind(&reservation_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get("status");
    assert_eq!(status, "COMPLETED");
}

#[tokio::test]
async fn test_sweep_enqueues_reminders_once() {
    let app = TestApp::new().await;
    let (reservation_id, order_id) = setup_booking(&app).await;

    let res = app
        .post(
            "/api/v1/payments/verify",
            "mentee-1",
            json!({ "order_id": order_id, "price": 20000, "payment_key": "pk_bg" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Move the session inside the reminder window.
    sqlx::query("UPDATE reservations SET start_time = ?, end_time = ? WHERE id = ?")
        .bind(Utc::now() + Duration::minutes(5))
        .bind(Utc::now() + Duration::minutes(65))
        .bind(&reservation_id)
        .execute(&app.pool)
        .await
        .unwrap();

    run_sweep(&app.state).await;
    run_sweep(&app.state).await;

    let count: i64 = sqlx::query(
        "SELECT COUNT(*) as count FROM outbox_events WHERE event_type = 'RESERVATION_REMINDER'",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap()
    .get("count");
    assert_eq!(count, 1);

    let sent: bool = sqlx::query("SELECT reminder_sent FROM reservations WHERE id = ?")
        .bind(&reservation_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .get("reminder_sent");
    assert!(sent);
}
