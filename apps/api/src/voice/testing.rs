//! In-memory [`VoiceProvider`] for tests: serves canned calls and records
//! mutations instead of talking to the provider.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{
    CallDetail, PhoneNumberUpdate, ProviderPhoneNumber, RegisteredCall, VoiceError, VoiceProvider,
};

#[derive(Default)]
pub struct FakeVoice {
    pub calls: Vec<CallDetail>,
    pub analysis_triggers: Mutex<Vec<String>>,
    pub number_updates: Mutex<Vec<(String, PhoneNumberUpdate)>>,
}

impl FakeVoice {
    pub fn with_calls(calls: Vec<CallDetail>) -> Self {
        Self {
            calls,
            ..Default::default()
        }
    }
}

#[async_trait]
impl VoiceProvider for FakeVoice {
    async fn create_web_call(
        &self,
        agent_id: &str,
        _dynamic_data: Option<Value>,
    ) -> Result<RegisteredCall, VoiceError> {
        Ok(RegisteredCall {
            call_id: format!("call_{agent_id}"),
            access_token: "tok_fake".to_string(),
            extra: Map::new(),
        })
    }

    async fn get_call(&self, call_id: &str) -> Result<CallDetail, VoiceError> {
        self.calls
            .iter()
            .find(|call| call.call_id == call_id)
            .cloned()
            .ok_or(VoiceError::Api {
                status: 404,
                message: format!("call {call_id} not found"),
            })
    }

    async fn list_agent_calls(&self, agent_id: &str) -> Result<Vec<CallDetail>, VoiceError> {
        Ok(self
            .calls
            .iter()
            .filter(|call| call.agent_id.as_deref() == Some(agent_id))
            .cloned()
            .collect())
    }

    async fn list_recent_calls(&self) -> Result<Vec<CallDetail>, VoiceError> {
        Ok(self.calls.clone())
    }

    async fn trigger_analysis(&self, call_id: &str) -> Result<(), VoiceError> {
        self.analysis_triggers
            .lock()
            .unwrap()
            .push(call_id.to_string());
        Ok(())
    }

    async fn create_phone_number(
        &self,
        area_code: u16,
    ) -> Result<ProviderPhoneNumber, VoiceError> {
        Ok(ProviderPhoneNumber {
            phone_number: format!("+1{area_code}5550100"),
            extra: Map::new(),
        })
    }

    async fn update_phone_number(
        &self,
        number: &str,
        update: PhoneNumberUpdate,
    ) -> Result<(), VoiceError> {
        self.number_updates
            .lock()
            .unwrap()
            .push((number.to_string(), update));
        Ok(())
    }
}
