use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Progress,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Progress => "PROGRESS",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ReservationStatus::Pending),
            "CONFIRMED" => Some(ReservationStatus::Confirmed),
            "PROGRESS" => Some(ReservationStatus::Progress),
            "CANCELLED" => Some(ReservationStatus::Cancelled),
            "COMPLETED" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Reservation {
    pub id: String,
    pub program_id: String,
    pub schedule_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    /// Set on mentor rejection or cancellation.
    pub reason: Option<String>,
    pub reminder_sent: bool,
    /// Soft-lock deadline while unpaid; cleared once the payment lands.
    pub expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

pub struct NewReservationParams {
    pub program_id: String,
    pub schedule_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub lock_minutes: i64,
}

impl Reservation {
    pub fn new(params: NewReservationParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            program_id: params.program_id,
            schedule_id: params.schedule_id,
            user_id: params.user_id,
            start_time: params.start_time,
            end_time: params.end_time,
            status: ReservationStatus::Pending.as_str().to_string(),
            reason: None,
            reminder_sent: false,
            expire: Some(now + Duration::minutes(params.lock_minutes)),
            created_at: now,
        }
    }

    pub fn status(&self) -> Option<ReservationStatus> {
        ReservationStatus::parse(&self.status)
    }
}
