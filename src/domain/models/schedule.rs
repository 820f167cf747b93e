use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One open wall-clock range, "HH:MM" strings with no timezone. The same
/// civil time applies every week.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: String,
    pub end_time: String,
}

/// A mentor's recurring weekly availability. Ranges are stored as given;
/// sorting and overlap hygiene are the editing caller's responsibility.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    #[serde(default)]
    pub monday: Vec<TimeRange>,
    #[serde(default)]
    pub tuesday: Vec<TimeRange>,
    #[serde(default)]
    pub wednesday: Vec<TimeRange>,
    #[serde(default)]
    pub thursday: Vec<TimeRange>,
    #[serde(default)]
    pub friday: Vec<TimeRange>,
    #[serde(default)]
    pub saturday: Vec<TimeRange>,
    #[serde(default)]
    pub sunday: Vec<TimeRange>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailableSchedule {
    pub id: String,
    pub program_id: String,
    pub weekly: Json<WeeklySchedule>,
    pub created_at: DateTime<Utc>,
}

impl AvailableSchedule {
    pub fn new(program_id: String, weekly: WeeklySchedule) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            program_id,
            weekly: Json(weekly),
            created_at: Utc::now(),
        }
    }
}
