use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Contact details the mentee leaves for the mentor at booking time.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Contact {
    pub id: String,
    pub reservation_id: String,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(reservation_id: String, phone: String, email: String, message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reservation_id,
            phone,
            email,
            message,
            created_at: Utc::now(),
        }
    }
}
