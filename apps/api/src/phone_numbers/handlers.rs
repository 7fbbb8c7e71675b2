use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::phone_numbers::{backfill, service};
use crate::responses::service as response_service;
use crate::state::AppState;
use crate::voice::LIST_CALLS_LIMIT;

/// GET /api/phone-numbers
pub async fn handle_list(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<Value>, AppError> {
    let phone_numbers = service::get_phone_numbers(&state.db, &session.org_id).await?;
    Ok(Json(json!({ "phoneNumbers": phone_numbers })))
}

/// Area codes arrive as either a JSON string or a number, depending on the
/// dashboard form state.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AreaCode {
    Text(String),
    Number(u64),
}

impl AreaCode {
    fn normalized(&self) -> String {
        match self {
            AreaCode::Text(text) => text.clone(),
            AreaCode::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquireRequest {
    pub area_code: Option<AreaCode>,
    pub nickname: Option<String>,
}

/// POST /api/phone-numbers/acquire
pub async fn handle_acquire(
    State(state): State<AppState>,
    session: AuthSession,
    Json(req): Json<AcquireRequest>,
) -> Result<Json<Value>, AppError> {
    let area_code = req
        .area_code
        .as_ref()
        .map(AreaCode::normalized)
        .unwrap_or_default();
    info!("Acquiring phone number with area code: {area_code}");

    if !service::is_valid_area_code(&area_code) {
        return Err(AppError::Validation(format!(
            "Invalid area code: {area_code}. Must be a 3-digit number."
        )));
    }
    // Validation guarantees this parses.
    let area_code: u16 = area_code.parse().map_err(anyhow::Error::from)?;

    let phone_number = service::acquire_phone_number(
        &state.db,
        state.voice.as_ref(),
        &session.org_id,
        area_code,
        req.nickname,
    )
    .await?;

    info!("Successfully acquired phone number: {}", phone_number.number);
    Ok(Json(json!({ "phoneNumber": phone_number })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    pub phone_number_id: Option<i64>,
    pub agent_id: Option<String>,
    pub interview_id: Option<String>,
}

/// POST /api/phone-numbers/link
pub async fn handle_link(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(req): Json<LinkRequest>,
) -> Result<Json<Value>, AppError> {
    let phone_number_id = req
        .phone_number_id
        .ok_or_else(|| AppError::Validation("Missing phone number ID".to_string()))?;
    let agent_id = req
        .agent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing agent ID".to_string()))?;
    let interview_id = req
        .interview_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing interview ID".to_string()))?;

    info!(
        "Attempting to link phone number {phone_number_id} to agent {agent_id}, interview {interview_id}"
    );

    let phone_number = service::link_phone_number(
        &state.db,
        state.voice.as_ref(),
        &state.config,
        phone_number_id,
        &agent_id,
        &interview_id,
    )
    .await?;

    info!(
        "Successfully linked phone number {} to agent {agent_id}",
        phone_number.number
    );
    Ok(Json(json!({ "phoneNumber": phone_number })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkRequest {
    pub phone_number_id: Option<i64>,
}

/// POST /api/phone-numbers/unlink
pub async fn handle_unlink(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(req): Json<UnlinkRequest>,
) -> Result<Json<Value>, AppError> {
    let phone_number_id = req
        .phone_number_id
        .ok_or_else(|| AppError::Validation("Missing phone number ID".to_string()))?;

    let phone_number =
        service::unlink_phone_number(&state.db, state.voice.as_ref(), phone_number_id).await?;

    Ok(Json(json!({ "phoneNumber": phone_number })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallsQuery {
    pub interview_id: Option<String>,
    pub phone_number_id: Option<i64>,
}

/// GET /api/phone-numbers/calls?interviewId=&phoneNumberId=
///
/// Stored responses for an interview; when a phone number is named, missed
/// calls on that number are backfilled first.
pub async fn handle_calls(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<CallsQuery>,
) -> Result<Json<Value>, AppError> {
    let interview_id = query
        .interview_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing interview ID".to_string()))?;

    info!(
        "Fetching calls for interview {interview_id} (org {})",
        session.org_id
    );

    let mut backfilled_number = None;
    if let Some(phone_number_id) = query.phone_number_id {
        let phone_number = service::get_phone_number_by_id(&state.db, phone_number_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Phone number {phone_number_id} not found"))
            })?;

        let report = backfill::backfill_number_calls(
            &state.db,
            state.voice.as_ref(),
            &phone_number.number,
            &interview_id,
        )
        .await?;
        info!(
            "Backfilled {} calls for number {}",
            report.new_call_ids.len(),
            phone_number.number
        );
        backfilled_number = Some(phone_number.number);
    }

    let responses = response_service::get_all_responses(&state.db, &interview_id).await?;

    Ok(Json(json!({
        "responses": responses,
        "phoneNumber": backfilled_number,
    })))
}

/// GET /api/phone-numbers/calls/:phoneNumber
///
/// Recent provider call history for one number; read-only, no persistence.
pub async fn handle_calls_for_number(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(phone_number): Path<String>,
) -> Result<Json<Value>, AppError> {
    if phone_number.is_empty() {
        return Err(AppError::Validation("Missing phone number".to_string()));
    }

    let formatted = if phone_number.starts_with('+') {
        phone_number
    } else {
        format!("+{phone_number}")
    };
    info!("Fetching calls for phone number {formatted}");

    let all_calls = state.voice.list_recent_calls().await?;
    let total = all_calls.len();
    let calls = backfill::calls_for_number(all_calls, &formatted);
    info!(
        "Found {} calls for number {formatted} out of {total} total",
        calls.len()
    );

    Ok(Json(json!({
        "calls": calls,
        "phoneNumber": formatted,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAgentCallsRequest {
    pub agent_id: Option<String>,
    pub interview_id: Option<String>,
}

/// POST /api/phone-numbers/list-agent-calls
///
/// Pulls the agent's recent calls (up to the provider page size), backfills
/// missing responses, and returns the refreshed set with diff counts.
pub async fn handle_list_agent_calls(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(req): Json<ListAgentCallsRequest>,
) -> Result<Json<Value>, AppError> {
    let agent_id = req
        .agent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing agent ID".to_string()))?;
    let interview_id = req
        .interview_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing interview ID".to_string()))?;

    info!(
        "Fetching up to {LIST_CALLS_LIMIT} calls for agent {agent_id}, interview {interview_id}"
    );

    let report = backfill::backfill_agent_calls(
        &state.db,
        state.voice.as_ref(),
        &agent_id,
        &interview_id,
    )
    .await?;

    let responses = response_service::get_all_responses(&state.db, &interview_id).await?;

    Ok(Json(json!({
        "success": true,
        "totalCalls": report.total_calls,
        "newCalls": report.new_call_ids.len(),
        "callIds": report.new_call_ids,
        "responses": responses,
    })))
}
