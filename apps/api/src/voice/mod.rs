//! Voice provider client — the single point of entry for all provider calls.
//!
//! ARCHITECTURAL RULE: no other module may call the voice provider API
//! directly. All provider traffic MUST go through this module.
//!
//! `AppState` carries the client as `Arc<dyn VoiceProvider>` so the webhook
//! reconciler and backfill logic can be exercised against a mock provider.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::{json, Value};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, info};

#[cfg(test)]
pub mod testing;
pub mod types;

pub use types::{
    CallAnalysis, CallDetail, CallMetadata, PhoneNumberUpdate, ProviderPhoneNumber,
    RegisteredCall, Transcript, TranscriptTurn, WebhookEnvelope, WebhookEventKind,
};

const PROVIDER_API_URL: &str = "https://api.retellai.com";
/// Both call-listing endpoints cap at the provider's page size.
pub const LIST_CALLS_LIMIT: u32 = 50;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("provider response missing field: {0}")]
    MissingField(&'static str),
}

/// The provider operations the rest of the application depends on.
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Registers a browser call for an agent, returning the call id and the
    /// access token the web client needs to join.
    async fn create_web_call(
        &self,
        agent_id: &str,
        dynamic_data: Option<Value>,
    ) -> Result<RegisteredCall, VoiceError>;

    /// Fetches the full call object, including analysis when available.
    async fn get_call(&self, call_id: &str) -> Result<CallDetail, VoiceError>;

    /// Most recent calls for an agent, newest first (v2 list endpoint).
    async fn list_agent_calls(&self, agent_id: &str) -> Result<Vec<CallDetail>, VoiceError>;

    /// Most recent calls across the account (v1 list endpoint).
    async fn list_recent_calls(&self) -> Result<Vec<CallDetail>, VoiceError>;

    /// Asks the provider to (re)run analysis for a call.
    async fn trigger_analysis(&self, call_id: &str) -> Result<(), VoiceError>;

    /// Provisions a phone number in the given area code.
    async fn create_phone_number(&self, area_code: u16)
        -> Result<ProviderPhoneNumber, VoiceError>;

    /// Applies a partial update (agent binding, webhook URL, metadata) to a
    /// provisioned number.
    async fn update_phone_number(
        &self,
        number: &str,
        update: PhoneNumberUpdate,
    ) -> Result<(), VoiceError>;
}

/// HTTP implementation of [`VoiceProvider`].
#[derive(Clone)]
pub struct VoiceClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl VoiceClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url: PROVIDER_API_URL.to_string(),
        }
    }

    /// Reads the body once and converts non-2xx statuses into `VoiceError::Api`
    /// with the provider's message, logging status and body for diagnosis.
    async fn read_response(&self, response: reqwest::Response) -> Result<Value, VoiceError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Provider error (status {}): {}", status.as_u16(), body);
            return Err(VoiceError::Api {
                status: status.as_u16(),
                message: extract_provider_message(&body),
            });
        }

        debug!("Provider response ({} bytes)", body.len());
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_json(&self, path: &str) -> Result<Value, VoiceError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        self.read_response(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, VoiceError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        self.read_response(response).await
    }
}

#[async_trait]
impl VoiceProvider for VoiceClient {
    async fn create_web_call(
        &self,
        agent_id: &str,
        dynamic_data: Option<Value>,
    ) -> Result<RegisteredCall, VoiceError> {
        let mut body = json!({ "agent_id": agent_id });
        if let Some(data) = dynamic_data {
            body["retell_llm_dynamic_variables"] = data;
        }

        let value = self.post_json("/v2/create-web-call", &body).await?;
        let call: RegisteredCall = serde_json::from_value(value)?;
        if call.call_id.is_empty() {
            return Err(VoiceError::MissingField("call_id"));
        }
        info!("Registered web call {} for agent {agent_id}", call.call_id);
        Ok(call)
    }

    async fn get_call(&self, call_id: &str) -> Result<CallDetail, VoiceError> {
        let value = self.get_json(&format!("/v2/get-call/{call_id}")).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn list_agent_calls(&self, agent_id: &str) -> Result<Vec<CallDetail>, VoiceError> {
        let body = json!({
            "sort_order": "descending",
            "limit": LIST_CALLS_LIMIT,
            "filter_criteria": { "agent_id": [agent_id] }
        });

        let value = self.post_json("/v2/list-calls", &body).await?;
        // The v2 endpoint returns a bare array.
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    async fn list_recent_calls(&self) -> Result<Vec<CallDetail>, VoiceError> {
        let value = self
            .get_json(&format!("/v1/calls?limit={LIST_CALLS_LIMIT}"))
            .await?;
        // The v1 endpoint wraps the array: { "calls": [...] }.
        match value.get("calls") {
            Some(calls) => Ok(serde_json::from_value(calls.clone()).unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    async fn trigger_analysis(&self, call_id: &str) -> Result<(), VoiceError> {
        self.post_json(&format!("/v1/calls/{call_id}/analyzation"), &json!({}))
            .await?;
        info!("Triggered analysis for call {call_id}");
        Ok(())
    }

    async fn create_phone_number(
        &self,
        area_code: u16,
    ) -> Result<ProviderPhoneNumber, VoiceError> {
        let value = self
            .post_json("/create-phone-number", &json!({ "area_code": area_code }))
            .await?;
        let number: ProviderPhoneNumber = serde_json::from_value(value)?;
        if number.phone_number.is_empty() {
            return Err(VoiceError::MissingField("phone_number"));
        }
        Ok(number)
    }

    async fn update_phone_number(
        &self,
        number: &str,
        update: PhoneNumberUpdate,
    ) -> Result<(), VoiceError> {
        let body = serde_json::to_value(&update)?;
        let response = self
            .client
            .patch(format!("{}/update-phone-number/{number}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        self.read_response(response).await?;
        Ok(())
    }
}

/// Pulls a human-readable message out of a provider error body, falling back
/// to the raw body when it is not the usual `{"error": {"message": ...}}` or
/// `{"message": ...}` shape.
fn extract_provider_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
    }
    body.to_string()
}

/// Verifies the webhook signature: hex-encoded HMAC-SHA256 of the raw body
/// keyed by the provider API key. Hex decode normalizes case; the MAC's own
/// verify does the constant-time comparison.
pub fn verify_webhook_signature(raw_body: &[u8], api_key: &str, signature: &str) -> bool {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(api_key.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);

    match hex::decode(signature) {
        Ok(provided) => mac.verify_slice(&provided).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(body: &[u8], key: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let body = br#"{"event":"call_started","call":{"call_id":"c1"}}"#;
        let signature = sign(body, "key_test");
        assert!(verify_webhook_signature(body, "key_test", &signature));
    }

    #[test]
    fn signature_comparison_is_case_insensitive() {
        let body = b"payload";
        let signature = sign(body, "key_test").to_uppercase();
        assert!(verify_webhook_signature(body, "key_test", &signature));
    }

    #[test]
    fn tampered_body_fails_verification() {
        let signature = sign(b"original", "key_test");
        assert!(!verify_webhook_signature(b"tampered", "key_test", &signature));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let body = b"payload";
        let signature = sign(body, "key_test");
        assert!(!verify_webhook_signature(body, "other_key", &signature));
    }

    #[test]
    fn garbage_signature_is_rejected() {
        assert!(!verify_webhook_signature(b"payload", "key_test", "not-hex"));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let body = b"payload";
        let mut signature = sign(body, "key_test");
        signature.truncate(signature.len() - 2);
        assert!(!verify_webhook_signature(body, "key_test", &signature));
    }

    #[test]
    fn provider_message_extraction_prefers_nested_error() {
        assert_eq!(
            extract_provider_message(r#"{"error":{"message":"no such agent"}}"#),
            "no such agent"
        );
        assert_eq!(
            extract_provider_message(r#"{"message":"rate limited"}"#),
            "rate limited"
        );
        assert_eq!(extract_provider_message("plain text"), "plain text");
    }
}
