use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::voice::{self, WebhookEnvelope, WebhookEventKind};
use crate::webhook::reconciler;

pub const SIGNATURE_HEADER: &str = "x-voice-signature";

/// POST /api/response-webhook
///
/// Provider call lifecycle callback. The signature is enforced in production
/// only; a failure in one event's processing is logged and does not fail the
/// request, so the provider never retries into a duplicate.
pub async fn handle_response_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    raw_body: String,
) -> Result<Json<Value>, AppError> {
    info!("Webhook event received");

    if state.config.is_production() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::InvalidSignature)?;

        if !voice::verify_webhook_signature(
            raw_body.as_bytes(),
            &state.config.voice_api_key,
            signature,
        ) {
            error!("Invalid webhook signature");
            return Err(AppError::InvalidSignature);
        }
    }

    let envelope: WebhookEnvelope = serde_json::from_str(&raw_body)
        .map_err(|e| AppError::Validation(format!("Malformed webhook body: {e}")))?;

    let call = &envelope.call;
    info!(
        "Event {:?} received for call {} ({})",
        envelope.event,
        call.call_id,
        if call.is_phone_call() { "phone" } else { "web" }
    );

    match envelope.event {
        WebhookEventKind::CallStarted => {
            let interview_id = reconciler::resolve_interview_id(&state.db, call).await;
            if let Err(e) = reconciler::handle_call_started(&state.db, call, interview_id).await {
                error!("Error creating response for call {}: {e}", call.call_id);
            }
        }
        WebhookEventKind::CallEnded => {
            if let Err(e) = reconciler::handle_call_ended(&state.db, call).await {
                error!("Error updating response for call {}: {e}", call.call_id);
            }
        }
        WebhookEventKind::CallAnalyzed => {
            if let Err(e) =
                reconciler::handle_call_analyzed(&state.db, state.voice.as_ref(), call).await
            {
                error!("Error processing analysis for call {}: {e}", call.call_id);
            }
        }
        WebhookEventKind::Unknown => {
            warn!("Received unknown webhook event for call {}", call.call_id);
        }
    }

    Ok(Json(json!({ "success": true })))
}

/// GET /api/test-webhook
///
/// Echo endpoint used to verify the provider's webhook configuration.
pub async fn handle_test_webhook_get(headers: HeaderMap) -> Json<Value> {
    info!("Test webhook endpoint called");
    log_headers(&headers);

    Json(json!({
        "success": true,
        "message": "Webhook test endpoint is working properly",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// POST /api/test-webhook
pub async fn handle_test_webhook_post(headers: HeaderMap, raw_body: String) -> Json<Value> {
    info!("Test webhook endpoint called with POST");
    log_headers(&headers);

    let received: Value = serde_json::from_str(&raw_body)
        .unwrap_or_else(|_| json!({ "error": "Could not parse JSON body", "raw": raw_body }));
    info!("Request body: {received}");

    Json(json!({
        "success": true,
        "message": "Webhook POST test endpoint is working properly",
        "receivedData": received,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

fn log_headers(headers: &HeaderMap) {
    for (name, value) in headers {
        info!("Header {}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
}
