use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;

/// A configured interview campaign.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InterviewRow {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    pub name: String,
    pub objective: Option<String>,
    pub job_context: Option<String>,
    /// JSON array of `{ "question": ... }` objects.
    pub questions: Value,
    /// Interview length in minutes, as the dashboard stores it.
    pub time_duration: Option<String>,
    pub is_anonymous: bool,
    /// Allow-list of respondent emails; empty or null means open to anyone.
    pub respondents: Option<Vec<String>>,
    pub interviewer_id: i64,
    /// Voice-provider agent bound to this interview, once configured.
    pub agent_id: Option<String>,
    pub theme_color: Option<String>,
    /// "web" or "phone".
    pub interview_type: String,
    pub is_active: bool,
}

impl InterviewRow {
    /// Question texts joined for the agent's dynamic variables.
    pub fn questions_joined(&self) -> String {
        self.questions
            .as_array()
            .map(|questions| {
                questions
                    .iter()
                    .filter_map(|q| q.get("question").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn questions_joined_flattens_question_objects() {
        let interview = InterviewRow {
            id: "iv1".to_string(),
            created_at: Utc::now(),
            organization_id: None,
            user_id: None,
            name: "Backend screen".to_string(),
            objective: None,
            job_context: None,
            questions: json!([
                { "question": "Tell me about yourself" },
                { "question": "Why Rust?" }
            ]),
            time_duration: Some("10".to_string()),
            is_anonymous: false,
            respondents: None,
            interviewer_id: 1,
            agent_id: None,
            theme_color: None,
            interview_type: "web".to_string(),
            is_active: true,
        };

        assert_eq!(
            interview.questions_joined(),
            "Tell me about yourself, Why Rust?"
        );
    }
}
