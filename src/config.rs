use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub toss_api_url: String,
    pub toss_secret_key: String,
    pub gateway_timeout_secs: u64,
    pub notify_service_url: String,
    pub notify_service_token: String,
    /// Soft-lock window for unpaid reservations, in minutes.
    pub reservation_lock_minutes: i64,
    /// How long before session start the reminder goes out, in minutes.
    pub reminder_lead_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            toss_api_url: env::var("TOSS_API_URL").unwrap_or_else(|_| "https://api.tosspayments.com".to_string()),
            toss_secret_key: env::var("TOSS_SECRET_KEY").expect("TOSS_SECRET_KEY must be set"),
            gateway_timeout_secs: env::var("GATEWAY_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string()).parse().expect("GATEWAY_TIMEOUT_SECS must be a number"),
            notify_service_url: env::var("NOTIFY_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8100/api/v1/push".to_string()),
            notify_service_token: env::var("NOTIFY_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            reservation_lock_minutes: env::var("RESERVATION_LOCK_MINUTES").unwrap_or_else(|_| "5".to_string()).parse().expect("RESERVATION_LOCK_MINUTES must be a number"),
            reminder_lead_minutes: env::var("REMINDER_LEAD_MINUTES").unwrap_or_else(|_| "10".to_string()).parse().expect("REMINDER_LEAD_MINUTES must be a number"),
        }
    }
}
