use konnect_backend::{
    api::router::create_router,
    config::Config,
    domain::ports::{CancelOutcome, ConfirmOutcome, Notifier, PaymentGateway},
    domain::services::payment_service::PaymentService,
    domain::services::reservation_service::ReservationService,
    error::AppError,
    infra::repositories::{
        sqlite_outbox_repo::SqliteOutboxRepo,
        sqlite_payment_repo::SqlitePaymentRepo,
        sqlite_program_repo::SqliteProgramRepo,
        sqlite_reservation_repo::SqliteReservationRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use konnect_backend::domain::models::outbox::OutboxEvent;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Scriptable payment gateway. Queued outcomes are consumed one per
/// confirm call; with an empty queue it approves and echoes the amount.
pub struct MockGateway {
    pub confirm_script: Mutex<VecDeque<ConfirmOutcome>>,
    pub cancel_script: Mutex<VecDeque<CancelOutcome>>,
    pub confirm_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            confirm_script: Mutex::new(VecDeque::new()),
            cancel_script: Mutex::new(VecDeque::new()),
            confirm_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn push_confirm(&self, outcome: ConfirmOutcome) {
        self.confirm_script.lock().unwrap().push_back(outcome);
    }

    pub fn push_cancel(&self, outcome: CancelOutcome) {
        self.cancel_script.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn confirm(
        &self,
        _order_id: &str,
        amount: i64,
        payment_key: &str,
    ) -> Result<ConfirmOutcome, AppError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.confirm_script.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or(ConfirmOutcome::Approved {
            status: "DONE".to_string(),
            total_amount: amount,
            receipt_url: Some(format!("https://receipts.test/{}", payment_key)),
        }))
    }

    async fn cancel(&self, _payment_key: &str, _reason: &str) -> Result<CancelOutcome, AppError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.cancel_script.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or(CancelOutcome::Cancelled))
    }
}

pub struct MockNotifier {
    pub delivered: Mutex<Vec<String>>,
    pub fail: Mutex<bool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            delivered: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn deliver(&self, event: &OutboxEvent) -> Result<(), AppError> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::InternalWithMsg("push service unavailable".into()));
        }
        self.delivered.lock().unwrap().push(event.event_type.clone());
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub gateway: Arc<MockGateway>,
    pub notifier: Arc<MockNotifier>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            toss_api_url: "http://localhost".to_string(),
            toss_secret_key: "test_sk".to_string(),
            gateway_timeout_secs: 1,
            notify_service_url: "http://localhost".to_string(),
            notify_service_token: "token".to_string(),
            reservation_lock_minutes: 5,
            reminder_lead_minutes: 10,
        };

        let gateway = Arc::new(MockGateway::new());
        let notifier = Arc::new(MockNotifier::new());

        let program_repo = Arc::new(SqliteProgramRepo::new(pool.clone()));
        let reservation_repo = Arc::new(SqliteReservationRepo::new(pool.clone()));
        let payment_repo = Arc::new(SqlitePaymentRepo::new(pool.clone()));
        let outbox_repo = Arc::new(SqliteOutboxRepo::new(pool.clone()));

        let reservation_service = Arc::new(ReservationService::new(
            program_repo.clone(),
            reservation_repo.clone(),
            payment_repo.clone(),
            gateway.clone(),
            config.reservation_lock_minutes,
        ));
        let payment_service = Arc::new(PaymentService::new(payment_repo.clone(), gateway.clone()));

        let state = Arc::new(AppState {
            config,
            program_repo,
            reservation_repo,
            payment_repo,
            outbox_repo,
            gateway: gateway.clone(),
            notifier: notifier.clone(),
            reservation_service,
            payment_service,
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            gateway,
            notifier,
        }
    }

    pub async fn post(&self, uri: &str, user_id: &str, body: Value) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("x-user-id", user_id)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, user_id: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header("x-user-id", user_id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A weekly schedule covering every day with the same single window.
pub fn full_week(start: &str, end: &str) -> Value {
    let window = serde_json::json!([{ "startTime": start, "endTime": end }]);
    serde_json::json!({
        "monday": window.clone(),
        "tuesday": window.clone(),
        "wednesday": window.clone(),
        "thursday": window.clone(),
        "friday": window.clone(),
        "saturday": window.clone(),
        "sunday": window,
    })
}
