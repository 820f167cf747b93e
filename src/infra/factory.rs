use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::services::payment_service::PaymentService;
use crate::domain::services::reservation_service::ReservationService;
use crate::infra::gateway::toss_gateway::TossGateway;
use crate::infra::notify::http_notifier::HttpNotifier;
use crate::infra::repositories::{
    postgres_outbox_repo::PostgresOutboxRepo, postgres_payment_repo::PostgresPaymentRepo,
    postgres_program_repo::PostgresProgramRepo, postgres_reservation_repo::PostgresReservationRepo,
    sqlite_outbox_repo::SqliteOutboxRepo, sqlite_payment_repo::SqlitePaymentRepo,
    sqlite_program_repo::SqliteProgramRepo, sqlite_reservation_repo::SqliteReservationRepo,
};
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let gateway = Arc::new(TossGateway::new(
        config.toss_api_url.clone(),
        &config.toss_secret_key,
        config.gateway_timeout_secs,
    ));

    let notifier = Arc::new(HttpNotifier::new(
        config.notify_service_url.clone(),
        config.notify_service_token.clone(),
    ));

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let program_repo = Arc::new(PostgresProgramRepo::new(pool.clone()));
        let reservation_repo = Arc::new(PostgresReservationRepo::new(pool.clone()));
        let payment_repo = Arc::new(PostgresPaymentRepo::new(pool.clone()));
        let outbox_repo = Arc::new(PostgresOutboxRepo::new(pool.clone()));

        let reservation_service = Arc::new(ReservationService::new(
            program_repo.clone(),
            reservation_repo.clone(),
            payment_repo.clone(),
            gateway.clone(),
            config.reservation_lock_minutes,
        ));
        let payment_service = Arc::new(PaymentService::new(payment_repo.clone(), gateway.clone()));

        AppState {
            config: config.clone(),
            program_repo,
            reservation_repo,
            payment_repo,
            outbox_repo,
            gateway,
            notifier,
            reservation_service,
            payment_service,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

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

        AppState {
            config: config.clone(),
            program_repo,
            reservation_repo,
            payment_repo,
            outbox_repo,
            gateway,
            notifier,
            reservation_service,
            payment_service,
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
