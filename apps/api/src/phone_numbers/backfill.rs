//! Backfill: recover calls the webhook never delivered.
//!
//! Pulls recent calls from the provider, diffs them against the response
//! rows already stored for an interview, and creates rows for the missing
//! ended calls. Each call is processed in isolation so one bad payload never
//! aborts the batch.

use std::collections::HashSet;

use serde_json::Value;
use sqlx::PgPool;
use tracing::{error, info};

use crate::errors::AppError;
use crate::responses::analytics::analytics_from_call;
use crate::responses::service::{self, NewResponse};
use crate::voice::{CallDetail, VoiceProvider};
use crate::webhook::name_extract;

/// The pure diff at the heart of backfill: which provider calls need rows.
/// Only ended calls qualify; in-flight ones will be seen again.
pub fn plan_backfill<'a>(
    calls: &'a [CallDetail],
    existing_call_ids: &HashSet<String>,
) -> Vec<&'a CallDetail> {
    calls
        .iter()
        .filter(|call| call.is_ended() && !existing_call_ids.contains(&call.call_id))
        .collect()
}

/// Account-wide recent calls narrowed to one number.
pub fn calls_for_number(calls: Vec<CallDetail>, number: &str) -> Vec<CallDetail> {
    calls
        .into_iter()
        .filter(|call| call.phone_number.as_deref() == Some(number))
        .collect()
}

/// Outcome of a backfill pass, as reported to the dashboard.
#[derive(Debug)]
pub struct BackfillReport {
    pub total_calls: usize,
    pub new_call_ids: Vec<String>,
}

/// Backfills responses for an agent's recent calls and triggers analysis for
/// any call that arrived without one.
pub async fn backfill_agent_calls(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    agent_id: &str,
    interview_id: &str,
) -> Result<BackfillReport, AppError> {
    let existing: HashSet<String> = service::get_call_ids(pool, interview_id)
        .await?
        .into_iter()
        .collect();
    info!(
        "Found {} existing responses for interview {interview_id}",
        existing.len()
    );

    let calls = voice.list_agent_calls(agent_id).await?;
    info!("Provider returned {} calls for agent {agent_id}", calls.len());

    let missing = plan_backfill(&calls, &existing);
    info!("{} new calls to add", missing.len());

    let mut new_call_ids = Vec::with_capacity(missing.len());
    for call in missing {
        match persist_backfilled_call(pool, voice, call, interview_id).await {
            Ok(()) => new_call_ids.push(call.call_id.clone()),
            Err(e) => error!("Error processing call {}: {e}", call.call_id),
        }
    }

    Ok(BackfillReport {
        total_calls: calls.len(),
        new_call_ids,
    })
}

/// Backfills responses for ended calls on a specific number, from the
/// account-wide recent-call list.
pub async fn backfill_number_calls(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    number: &str,
    interview_id: &str,
) -> Result<BackfillReport, AppError> {
    let existing: HashSet<String> = service::get_call_ids(pool, interview_id)
        .await?
        .into_iter()
        .collect();

    let calls = calls_for_number(voice.list_recent_calls().await?, number);
    info!("Found {} recent calls for number {number}", calls.len());

    let missing = plan_backfill(&calls, &existing);

    let mut new_call_ids = Vec::with_capacity(missing.len());
    for call in missing {
        match persist_backfilled_call(pool, voice, call, interview_id).await {
            Ok(()) => new_call_ids.push(call.call_id.clone()),
            Err(e) => error!("Error processing call {}: {e}", call.call_id),
        }
    }

    Ok(BackfillReport {
        total_calls: calls.len(),
        new_call_ids,
    })
}

/// Creates the response row for one recovered call and triggers analysis if
/// the provider has not produced one yet. Analysis-trigger failures are
/// logged only; the row is already safe.
async fn persist_backfilled_call(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    call: &CallDetail,
    interview_id: &str,
) -> Result<(), AppError> {
    let name = name_extract::caller_name(call.transcript.as_ref());
    let has_analysis = call.call_analysis.is_some();

    service::create_response_if_absent(
        pool,
        NewResponse {
            interview_id: interview_id.to_string(),
            call_id: call.call_id.clone(),
            name: Some(name),
            email: None,
            is_ended: call.is_ended(),
            is_analysed: has_analysis,
            details: Some(details_with_interview(call, interview_id)),
            analytics: analytics_from_call(call),
        },
    )
    .await?;

    if !has_analysis {
        if let Err(e) = voice.trigger_analysis(&call.call_id).await {
            error!("Error triggering analysis for call {}: {e}", call.call_id);
        }
    }

    info!("Backfilled call {}", call.call_id);
    Ok(())
}

/// The stored payload always carries the interview id in metadata, even when
/// the provider payload lacked it, so later resolution never misses.
fn details_with_interview(call: &CallDetail, interview_id: &str) -> Value {
    let mut details = serde_json::to_value(call).unwrap_or(Value::Null);
    if call.metadata_interview_id().is_none() {
        if let Some(object) = details.as_object_mut() {
            object.insert(
                "metadata".to_string(),
                serde_json::json!({ "interview_id": interview_id }),
            );
        }
    }
    details
}
