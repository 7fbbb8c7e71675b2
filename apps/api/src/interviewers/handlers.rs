use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::interviewers::service;
use crate::state::AppState;

/// GET /api/interviewers/:interviewerId
pub async fn handle_get_interviewer(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(interviewer_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    info!("Fetching interviewer {interviewer_id}");

    let interviewer = service::get_interviewer(&state.db, interviewer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interviewer {interviewer_id} not found")))?;

    info!("Successfully retrieved interviewer: {}", interviewer.name);
    Ok(Json(json!({ "interviewer": interviewer })))
}
