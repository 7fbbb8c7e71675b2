use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Manual screening decision a reviewer can assign to a response.
/// Stored as TEXT in the `responses` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    #[default]
    NoStatus,
    NotSelected,
    Potential,
    Selected,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::NoStatus => "NO_STATUS",
            CandidateStatus::NotSelected => "NOT_SELECTED",
            CandidateStatus::Potential => "POTENTIAL",
            CandidateStatus::Selected => "SELECTED",
        }
    }
}

/// One candidate's attempt at an interview. Created when a call is registered
/// or first observed via webhook/backfill; mutated by call-ended and
/// call-analyzed events and by manual status changes.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub interview_id: String,
    /// Externally assigned by the voice provider; unique by policy.
    pub call_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_ended: bool,
    pub is_analysed: bool,
    pub is_viewed: bool,
    pub candidate_status: String,
    /// Call duration in seconds.
    pub duration: i32,
    pub tab_switch_count: i32,
    /// Raw provider call payload, persisted for later analysis extraction.
    pub details: Option<Value>,
    /// Computed analytics blob (summary, sentiment, success).
    pub analytics: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&CandidateStatus::NotSelected).unwrap(),
            "\"NOT_SELECTED\""
        );
        let parsed: CandidateStatus = serde_json::from_str("\"POTENTIAL\"").unwrap();
        assert_eq!(parsed, CandidateStatus::Potential);
    }

    #[test]
    fn default_status_is_no_status() {
        assert_eq!(CandidateStatus::default().as_str(), "NO_STATUS");
    }
}
