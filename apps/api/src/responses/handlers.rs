use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::interviewers;
use crate::interviews;
use crate::models::interview::InterviewRow;
use crate::responses::analytics::fetch_and_persist_analysis;
use crate::responses::service::{self, NewResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterCallRequest {
    pub interviewer_id: i64,
    pub interview_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub dynamic_data: Option<Value>,
    #[serde(default)]
    pub is_practice: bool,
}

/// POST /api/register-call
///
/// Registers a web call with the voice provider and, for real sessions,
/// creates the initial response row. Practice sessions get a call but no
/// row — they are never persisted.
pub async fn handle_register_call(
    State(state): State<AppState>,
    Json(req): Json<RegisterCallRequest>,
) -> Result<Json<Value>, AppError> {
    info!("register-call request received");

    let interview_id = req
        .interview_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing interview ID".to_string()))?;

    let interviewer = interviewers::service::get_interviewer(&state.db, req.interviewer_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Interviewer {} not found", req.interviewer_id))
        })?;
    let agent_id = interviewer.agent_id.ok_or_else(|| {
        AppError::NotFound(format!(
            "Interviewer {} has no agent configured",
            req.interviewer_id
        ))
    })?;

    // Callers may pass pre-built agent variables; otherwise derive them from
    // the interview itself.
    let dynamic_data = match req.dynamic_data {
        Some(data) => Some(data),
        None => {
            let interview = interviews::service::get_interview_by_id(&state.db, &interview_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Interview {interview_id} not found"))
                })?;
            Some(dynamic_variables(
                &interview,
                req.name.as_deref(),
                req.is_practice,
            ))
        }
    };

    let registered = state
        .voice
        .create_web_call(&agent_id, dynamic_data)
        .await?;

    info!("Call registered with provider: {}", registered.call_id);

    if !req.is_practice {
        let details = serde_json::to_value(&registered).ok();
        service::create_response(
            &state.db,
            NewResponse {
                interview_id,
                call_id: registered.call_id.clone(),
                name: req.name,
                email: req.email,
                details,
                ..Default::default()
            },
        )
        .await?;
    }

    Ok(Json(json!({
        "registerCallResponse": {
            "call_id": registered.call_id,
            "access_token": registered.access_token,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct GetCallRequest {
    pub id: String,
}

/// POST /api/get-call
///
/// Pulls the full call object from the provider and persists derived
/// analytics and duration onto the matching response.
pub async fn handle_get_call(
    State(state): State<AppState>,
    Json(req): Json<GetCallRequest>,
) -> Result<Json<Value>, AppError> {
    if req.id.is_empty() {
        return Err(AppError::Validation("Missing call ID".to_string()));
    }

    let (call, analytics) =
        fetch_and_persist_analysis(&state.db, state.voice.as_ref(), &req.id).await?;

    Ok(Json(json!({
        "callResponse": call,
        "analytics": analytics,
    })))
}

/// GET /api/interviews/:interviewId/respondents
///
/// Emails already seen for an interview. The call client runs its
/// duplicate-respondent check against this before registering a real call.
pub async fn handle_get_respondent_emails(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let emails = service::get_all_emails(&state.db, &interview_id).await?;
    Ok(Json(json!({ "emails": emails })))
}

/// GET /api/responses/:callId
pub async fn handle_get_response(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(call_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let response = service::get_response_by_call_id(&state.db, &call_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Response for call {call_id} not found")))?;
    Ok(Json(json!({ "response": response })))
}

/// DELETE /api/responses/:callId
pub async fn handle_delete_response(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(call_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    service::delete_response(&state.db, &call_id).await?;
    info!("Deleted response for call {call_id}");
    Ok(Json(json!({ "success": true })))
}

/// Agent variables for a call: interview length, objective, joined question
/// texts, candidate name, job context. Practice calls are pinned to 2
/// minutes.
fn dynamic_variables(interview: &InterviewRow, name: Option<&str>, is_practice: bool) -> Value {
    let mins = if is_practice {
        "2".to_string()
    } else {
        interview.time_duration.clone().unwrap_or_default()
    };
    json!({
        "mins": mins,
        "objective": interview.objective,
        "questions": interview.questions_joined(),
        "name": name.filter(|n| !n.is_empty()).unwrap_or("not provided"),
        "job_context": interview
            .job_context
            .as_deref()
            .unwrap_or("No specific job context provided."),
    })
}
