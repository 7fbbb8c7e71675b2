use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::interviews::service;
use crate::state::AppState;

/// GET /api/interviews/:interviewId
pub async fn handle_get_interview(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(interview_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if interview_id.is_empty() {
        return Err(AppError::Validation("Missing interview ID".to_string()));
    }
    info!("Fetching interview {interview_id}");

    let interview = service::get_interview_by_id(&state.db, &interview_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {interview_id} not found")))?;

    info!("Successfully retrieved interview: {}", interview.name);
    Ok(Json(json!({ "interview": interview })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateInterviewRequest {
    pub agent_id: Option<String>,
}

/// POST /api/interviews/:interviewId/update
pub async fn handle_update_interview(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(interview_id): Path<String>,
    Json(req): Json<UpdateInterviewRequest>,
) -> Result<Json<Value>, AppError> {
    let agent_id = req
        .agent_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing agent_id in request body".to_string()))?;

    service::update_interview_agent(&state.db, &interview_id, &agent_id).await?;
    info!("Updated interview {interview_id} with agent {agent_id}");

    Ok(Json(json!({
        "success": true,
        "interviewId": interview_id,
        "agent_id": agent_id,
    })))
}
