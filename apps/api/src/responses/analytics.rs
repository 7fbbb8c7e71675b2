//! Maps provider call analysis into the analytics blob stored on a response.

use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::responses::service::{self, ResponseUpdate};
use crate::voice::{CallDetail, VoiceProvider};

/// Builds the analytics blob from a call's provider analysis.
/// Returns `None` when the provider has not analyzed the call yet.
pub fn analytics_from_call(call: &CallDetail) -> Option<Value> {
    let analysis = call.call_analysis.as_ref()?;
    Some(json!({
        "call_summary": analysis.call_summary,
        "user_sentiment": analysis.user_sentiment,
        "call_successful": analysis.call_successful,
    }))
}

/// Fetches the full call from the provider and persists derived analytics
/// and duration onto the matching response. Shared by the get-call route and
/// the `call_analyzed` webhook branch.
pub async fn fetch_and_persist_analysis(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    call_id: &str,
) -> Result<(CallDetail, Option<Value>), AppError> {
    let call = voice.get_call(call_id).await?;
    let analytics = analytics_from_call(&call);
    if analytics.is_none() {
        warn!("Call {call_id} has no analysis available yet");
    }

    service::save_response(
        pool,
        ResponseUpdate {
            is_analysed: Some(true),
            details: serde_json::to_value(&call).ok(),
            analytics: analytics.clone(),
            duration: call.duration_seconds(),
            ..Default::default()
        },
        call_id,
    )
    .await?;

    info!("Persisted analysis for call {call_id}");
    Ok((call, analytics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analyzed_call_yields_analytics_blob() {
        let call: CallDetail = serde_json::from_value(json!({
            "call_id": "c1",
            "call_analysis": {
                "call_summary": "Strong candidate, clear answers.",
                "user_sentiment": "Positive",
                "call_successful": true
            }
        }))
        .unwrap();

        let analytics = analytics_from_call(&call).unwrap();
        assert_eq!(analytics["call_summary"], "Strong candidate, clear answers.");
        assert_eq!(analytics["user_sentiment"], "Positive");
        assert_eq!(analytics["call_successful"], true);
    }

    #[test]
    fn unanalyzed_call_yields_none() {
        let call: CallDetail = serde_json::from_value(json!({ "call_id": "c2" })).unwrap();
        assert!(analytics_from_call(&call).is_none());
    }

    #[tokio::test]
    async fn provider_fetch_feeds_analytics_extraction() {
        use crate::voice::testing::FakeVoice;

        let call: CallDetail = serde_json::from_value(json!({
            "call_id": "c1",
            "call_analysis": { "user_sentiment": "Neutral", "call_successful": true }
        }))
        .unwrap();
        let voice = FakeVoice::with_calls(vec![call]);

        let fetched = voice.get_call("c1").await.unwrap();
        let analytics = analytics_from_call(&fetched).unwrap();
        assert_eq!(analytics["user_sentiment"], "Neutral");

        assert!(voice.get_call("missing").await.is_err());
    }
}
