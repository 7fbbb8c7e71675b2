use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A provisioned telephony number owned by an organization.
///
/// Invariant: `is_available == false` exactly when both `agent_linked` and
/// `interview_id` are set. Link and unlink write all three fields together.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhoneNumberRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// E.164 number string, unique.
    pub number: String,
    pub is_available: bool,
    pub agent_linked: Option<String>,
    pub interview_id: Option<String>,
    pub organization_id: Option<String>,
    pub nickname: Option<String>,
}

impl PhoneNumberRow {
    /// Checks the availability/link invariant.
    pub fn link_state_consistent(&self) -> bool {
        let fully_linked = self.agent_linked.is_some() && self.interview_id.is_some();
        self.is_available == !fully_linked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(is_available: bool, agent: Option<&str>, interview: Option<&str>) -> PhoneNumberRow {
        PhoneNumberRow {
            id: 1,
            created_at: Utc::now(),
            number: "+14155551234".to_string(),
            is_available,
            agent_linked: agent.map(String::from),
            interview_id: interview.map(String::from),
            organization_id: Some("org_1".to_string()),
            nickname: None,
        }
    }

    #[test]
    fn available_unlinked_number_is_consistent() {
        assert!(number(true, None, None).link_state_consistent());
    }

    #[test]
    fn linked_unavailable_number_is_consistent() {
        assert!(number(false, Some("agent_1"), Some("iv1")).link_state_consistent());
    }

    #[test]
    fn half_linked_number_is_inconsistent() {
        assert!(!number(false, Some("agent_1"), None).link_state_consistent());
        assert!(!number(true, Some("agent_1"), Some("iv1")).link_state_consistent());
    }
}
