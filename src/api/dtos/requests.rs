use crate::domain::models::schedule::WeeklySchedule;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateProgramRequest {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub duration_min: i32,
    pub available_schedule: WeeklySchedule,
}

#[derive(Deserialize)]
pub struct CreateReservationRequest {
    pub program_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub phone: String,
    pub email: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub approved: bool,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub price: i64,
    pub payment_key: String,
}

#[derive(Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationQuery {
    pub fn limit_offset(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(10).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (limit, (page - 1) * limit)
    }
}
