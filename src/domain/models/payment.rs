use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    pub id: String,
    /// Locally generated, unique; the correlation key towards the gateway.
    pub order_id: String,
    pub price: i64,
    pub title: String,
    pub payment_key: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub receipt_url: Option<String>,
    pub status: String,
    pub user_id: String,
    pub reservation_id: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(reservation_id: String, user_id: String, price: i64, title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: generate_order_id(),
            price,
            title,
            payment_key: None,
            paid_at: None,
            receipt_url: None,
            status: PaymentStatus::Pending.as_str().to_string(),
            user_id,
            reservation_id,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
    }
}

fn generate_order_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("MENTOR_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// A payment joined with the reservation/program columns the
/// reconciliation engine needs in one load.
#[derive(Debug, FromRow, Clone)]
pub struct PaymentContext {
    pub id: String,
    pub order_id: String,
    pub price: i64,
    pub title: String,
    pub payment_key: Option<String>,
    pub receipt_url: Option<String>,
    pub status: String,
    pub user_id: String,
    pub reservation_id: String,
    pub reservation_status: String,
    pub program_id: String,
    pub mentor_user_id: String,
}

impl PaymentContext {
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
    }

    pub fn reservation_status(&self) -> Option<crate::domain::models::reservation::ReservationStatus> {
        crate::domain::models::reservation::ReservationStatus::parse(&self.reservation_status)
    }
}
