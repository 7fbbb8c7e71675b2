//! Post-interview candidate feedback. Submission is a terminal side effect
//! of an ended session, never part of the call flow itself.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::feedback::FeedbackRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub interview_id: Option<String>,
    /// 1-5 rating, INT2 in the table.
    pub satisfaction: Option<i16>,
    pub feedback: Option<String>,
    pub email: Option<String>,
}

pub async fn submit_feedback(
    pool: &PgPool,
    interview_id: &str,
    satisfaction: Option<i16>,
    feedback: Option<String>,
    email: Option<String>,
) -> Result<FeedbackRow, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO feedback (interview_id, satisfaction, feedback, email)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(interview_id)
    .bind(satisfaction)
    .bind(feedback)
    .bind(email)
    .fetch_one(pool)
    .await
}

/// POST /api/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let interview_id = req
        .interview_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing interview ID".to_string()))?;

    let row = submit_feedback(
        &state.db,
        &interview_id,
        req.satisfaction,
        req.feedback,
        req.email,
    )
    .await?;

    info!("Feedback recorded for interview {interview_id}");
    Ok(Json(json!({ "success": true, "feedback": row })))
}
