use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// An interviewer persona backed by a voice-provider agent.
///
/// The persona sliders are stored as INT2; the field types must stay `i16`
/// or decoding the row fails.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InterviewerRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    /// Voice-provider agent that speaks as this persona.
    pub agent_id: Option<String>,
    pub rapport: i16,
    pub exploration: i16,
    pub empathy: i16,
    pub speed: i16,
    pub image: String,
    pub description: String,
    pub audio: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_sliders_are_smallint_width() {
        let interviewer = InterviewerRow {
            id: 1,
            created_at: Utc::now(),
            name: "Explorer Lisa".to_string(),
            agent_id: Some("agent_1".to_string()),
            rapport: 7i16,
            exploration: 10i16,
            empathy: 7i16,
            speed: 5i16,
            image: "/interviewers/lisa.png".to_string(),
            description: "Curious and empathetic".to_string(),
            audio: None,
        };

        let json = serde_json::to_value(&interviewer).unwrap();
        assert_eq!(json["exploration"], 10);
        assert_eq!(json["speed"], 5);
    }
}
