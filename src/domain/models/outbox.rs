use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const EVENT_BOOKING_CREATED: &str = "BOOKING_CREATED";
pub const EVENT_BOOKING_CONFIRMED: &str = "BOOKING_CONFIRMED";
pub const EVENT_BOOKING_CANCELLED: &str = "BOOKING_CANCELLED";
pub const EVENT_RESERVATION_APPROVED: &str = "RESERVATION_APPROVED";
pub const EVENT_RESERVATION_REJECTED: &str = "RESERVATION_REJECTED";
pub const EVENT_RESERVATION_REMINDER: &str = "RESERVATION_REMINDER";

/// A notification waiting to leave the building. Rows are written inside
/// the same transaction as the state change they announce; the background
/// dispatcher delivers them, so a notification failure can never roll a
/// booking or payment back.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct OutboxEvent {
    pub id: String,
    pub event_type: String,
    pub recipient_user_id: String,
    pub reservation_id: String,
    pub program_id: String,
    pub message: String,
    pub status: String, // PENDING | SENT | FAILED
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OutboxEvent {
    pub fn new(
        event_type: &str,
        recipient_user_id: String,
        reservation_id: String,
        program_id: String,
        message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            recipient_user_id,
            reservation_id,
            program_id,
            message,
            status: "PENDING".to_string(),
            error_message: None,
            created_at: Utc::now(),
        }
    }
}
