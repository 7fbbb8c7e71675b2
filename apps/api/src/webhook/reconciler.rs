//! Reconciles provider call lifecycle events with local response rows.
//!
//! Events arrive out of order, duplicated, or not at all; every handler here
//! is written to be safe under that. `call_started` is insert-if-absent so a
//! replayed event cannot duplicate a row; `call_ended` and `call_analyzed`
//! are unconditional updates scoped by call id (last write wins). Calls the
//! webhook never delivered are picked up later by the backfill paths in
//! `phone_numbers`.

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::phone_numbers::service as phone_service;
use crate::responses::analytics::fetch_and_persist_analysis;
use crate::responses::service::{self, NewResponse, ResponseUpdate};
use crate::voice::{CallDetail, VoiceProvider};
use crate::webhook::name_extract::{self, FALLBACK_CALLER_NAME};

/// Resolution policy for the interview a call belongs to: call metadata
/// first, then the phone-number table by exact number, then by linked agent.
/// Lookup failures are logged and treated as unresolved; the call stays out
/// of the system until backfill finds it.
pub async fn resolve_interview_id(pool: &PgPool, call: &CallDetail) -> Option<String> {
    if let Some(interview_id) = call.metadata_interview_id() {
        return Some(interview_id.to_string());
    }

    if let Some(number) = &call.phone_number {
        match phone_service::interview_for_number(pool, number).await {
            Ok(Some(interview_id)) => {
                info!("Found interview {interview_id} for phone number {number}");
                return Some(interview_id);
            }
            Ok(None) => {}
            Err(e) => warn!("Interview lookup by number failed: {e}"),
        }
    }

    if let Some(agent_id) = &call.agent_id {
        match phone_service::interview_for_agent(pool, agent_id).await {
            Ok(Some(interview_id)) => {
                info!("Found interview {interview_id} for agent {agent_id}");
                return Some(interview_id);
            }
            Ok(None) => {}
            Err(e) => warn!("Interview lookup by agent failed: {e}"),
        }
    }

    None
}

/// `call_started`: create the initial response row, once.
pub async fn handle_call_started(
    pool: &PgPool,
    call: &CallDetail,
    interview_id: Option<String>,
) -> Result<(), AppError> {
    let Some(interview_id) = interview_id else {
        warn!(
            "Could not determine interview for call {}, skipping persistence",
            call.call_id
        );
        return Ok(());
    };

    let name = call
        .is_phone_call()
        .then(|| FALLBACK_CALLER_NAME.to_string());

    let created = service::create_response_if_absent(
        pool,
        NewResponse {
            interview_id,
            call_id: call.call_id.clone(),
            name,
            details: serde_json::to_value(call).ok(),
            ..Default::default()
        },
    )
    .await?;

    if let Some(id) = created {
        info!("Created response {id} for started call {}", call.call_id);
    }
    Ok(())
}

/// `call_ended`: mark ended, store the final payload, and for phone calls
/// try to name the caller from the transcript.
pub async fn handle_call_ended(pool: &PgPool, call: &CallDetail) -> Result<(), AppError> {
    if let Some(transcript) = &call.transcript {
        debug!("Transcript for call {}: {}", call.call_id, transcript.as_text());
    }

    let name = if call.is_phone_call() {
        Some(name_extract::caller_name(call.transcript.as_ref()))
    } else {
        None
    };

    service::save_response(
        pool,
        ResponseUpdate {
            name,
            is_ended: Some(true),
            details: serde_json::to_value(call).ok(),
            ..Default::default()
        },
        &call.call_id,
    )
    .await?;

    info!("Marked response ended for call {}", call.call_id);
    Ok(())
}

/// `call_analyzed`: pull the full analysis from the provider. When that
/// secondary fetch fails, fall back to marking the response analyzed with
/// the webhook payload only — availability over completeness.
pub async fn handle_call_analyzed(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    call: &CallDetail,
) -> Result<(), AppError> {
    match fetch_and_persist_analysis(pool, voice, &call.call_id).await {
        Ok(_) => Ok(()),
        Err(e) => {
            warn!(
                "Analysis fetch failed for call {}, falling back to webhook payload: {e}",
                call.call_id
            );
            service::save_response(
                pool,
                ResponseUpdate {
                    is_analysed: Some(true),
                    details: serde_json::to_value(call).ok(),
                    ..Default::default()
                },
                &call.call_id,
            )
            .await?;
            Ok(())
        }
    }
}
