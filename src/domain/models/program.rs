use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Program {
    pub id: String,
    pub mentor_user_id: String,
    pub title: String,
    pub description: String,
    /// Session price in the smallest currency unit (KRW has no subunit).
    pub price: i64,
    pub duration_min: i32,
    pub created_at: DateTime<Utc>,
}

impl Program {
    pub fn new(
        mentor_user_id: String,
        title: String,
        description: String,
        price: i64,
        duration_min: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mentor_user_id,
            title,
            description,
            price,
            duration_min,
            created_at: Utc::now(),
        }
    }
}
