use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Post-interview feedback submitted by a candidate.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeedbackRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub interview_id: String,
    /// 1-5 satisfaction rating, stored as INT2.
    pub satisfaction: Option<i16>,
    pub feedback: Option<String>,
    pub email: Option<String>,
}
