//! Wire types for the voice provider API.
//!
//! Provider payloads are duck-typed on the wire; everything optional here is
//! genuinely absent on some call shapes (web vs phone, pre vs post analysis).
//! Unknown fields are retained in `extra` so the raw payload can be persisted
//! without loss.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One utterance in a structured transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptTurn {
    pub role: String,
    pub content: String,
}

/// Transcripts arrive either as flat text (list endpoints) or as an array of
/// role/content turns (webhook events).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Transcript {
    Text(String),
    Turns(Vec<TranscriptTurn>),
}

impl Transcript {
    /// Flat-text view of the transcript, regardless of wire shape.
    pub fn as_text(&self) -> String {
        match self {
            Transcript::Text(text) => text.clone(),
            Transcript::Turns(turns) => turns
                .iter()
                .map(|t| format!("{}: {}", t.role, t.content))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn turns(&self) -> Option<&[TranscriptTurn]> {
        match self {
            Transcript::Turns(turns) => Some(turns),
            Transcript::Text(_) => None,
        }
    }
}

/// Provider-computed call analysis, present once a call has been analyzed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallAnalysis {
    pub call_summary: Option<String>,
    pub user_sentiment: Option<String>,
    pub call_successful: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Metadata attached to a call at creation or phone-number link time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallMetadata {
    pub interview_id: Option<String>,
    pub phone_number: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A call as the provider describes it, from webhooks and list/get endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallDetail {
    pub call_id: String,
    pub agent_id: Option<String>,
    /// Set for phone calls only; its presence is how call type is decided.
    pub phone_number: Option<String>,
    pub metadata: Option<CallMetadata>,
    pub transcript: Option<Transcript>,
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
    pub call_analysis: Option<CallAnalysis>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallDetail {
    pub fn is_phone_call(&self) -> bool {
        self.phone_number.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.end_timestamp.is_some()
    }

    pub fn metadata_interview_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.interview_id.as_deref()
    }

    /// Call duration in whole seconds, when both timestamps are present.
    pub fn duration_seconds(&self) -> Option<i32> {
        let start = self.start_timestamp?;
        let end = self.end_timestamp?;
        if end < start {
            return None;
        }
        Some(((end - start) / 1000) as i32)
    }
}

/// Result of registering a web call: the browser needs the access token, we
/// need the call id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredCall {
    pub call_id: String,
    pub access_token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A phone number as provisioned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPhoneNumber {
    pub phone_number: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial update applied to a provider phone number. `None` fields are
/// omitted from the request; an empty `inbound_agent_id` clears the binding.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PhoneNumberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Webhook event kinds the provider emits. Anything else decodes to
/// `Unknown` and is logged rather than trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    CallStarted,
    CallEnded,
    CallAnalyzed,
    #[serde(other)]
    Unknown,
}

/// The webhook envelope: `{ "event": ..., "call": {...} }`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: WebhookEventKind,
    pub call: CallDetail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn webhook_envelope_decodes_known_event() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event": "call_ended",
            "call": {
                "call_id": "c1",
                "phone_number": "+14155551234",
                "transcript": [
                    { "role": "agent", "content": "What is your name?" },
                    { "role": "user", "content": "My name is Ada Lovelace" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(envelope.event, WebhookEventKind::CallEnded);
        assert!(envelope.call.is_phone_call());
        let turns = envelope.call.transcript.as_ref().unwrap().turns().unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn unknown_event_kind_decodes_to_unknown() {
        let envelope: WebhookEnvelope = serde_json::from_value(json!({
            "event": "call_transferred",
            "call": { "call_id": "c2" }
        }))
        .unwrap();

        assert_eq!(envelope.event, WebhookEventKind::Unknown);
    }

    #[test]
    fn flat_text_transcript_is_preserved() {
        let call: CallDetail = serde_json::from_value(json!({
            "call_id": "c3",
            "transcript": "agent: hello\nuser: hi, my name is Grace"
        }))
        .unwrap();

        let transcript = call.transcript.unwrap();
        assert!(transcript.turns().is_none());
        assert!(transcript.as_text().contains("Grace"));
    }

    #[test]
    fn unknown_call_fields_round_trip_through_extra() {
        let call: CallDetail = serde_json::from_value(json!({
            "call_id": "c4",
            "call_type": "web_call",
            "disconnection_reason": "user_hangup"
        }))
        .unwrap();

        let raw = serde_json::to_value(&call).unwrap();
        assert_eq!(raw["disconnection_reason"], "user_hangup");
    }

    #[test]
    fn metadata_interview_id_reads_nested_metadata() {
        let tagged: CallDetail = serde_json::from_value(json!({
            "call_id": "c6",
            "metadata": { "interview_id": "iv1" }
        }))
        .unwrap();
        assert_eq!(tagged.metadata_interview_id(), Some("iv1"));

        let untagged: CallDetail = serde_json::from_value(json!({ "call_id": "c7" })).unwrap();
        assert_eq!(untagged.metadata_interview_id(), None);
    }

    #[test]
    fn duration_derives_from_timestamps() {
        let call: CallDetail = serde_json::from_value(json!({
            "call_id": "c5",
            "start_timestamp": 1_700_000_000_000_i64,
            "end_timestamp": 1_700_000_083_500_i64
        }))
        .unwrap();

        assert_eq!(call.duration_seconds(), Some(83));
        assert!(call.is_ended());
    }
}
