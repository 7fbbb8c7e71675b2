//! CRUD over the `responses` table. Equality predicates only; every write is
//! scoped by call id or row id and applied unconditionally (last write wins,
//! per the concurrency model).

use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use crate::models::response::{CandidateStatus, ResponseRow};

/// Fields for a freshly created response row. Everything not listed starts
/// at its zero value (`NO_STATUS`, duration 0, no tab switches).
#[derive(Debug, Clone, Default)]
pub struct NewResponse {
    pub interview_id: String,
    pub call_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_ended: bool,
    pub is_analysed: bool,
    pub details: Option<Value>,
    pub analytics: Option<Value>,
}

/// Partial update applied by call id. `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ResponseUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_ended: Option<bool>,
    pub is_analysed: Option<bool>,
    pub is_viewed: Option<bool>,
    pub candidate_status: Option<CandidateStatus>,
    pub duration: Option<i32>,
    pub tab_switch_count: Option<i32>,
    pub details: Option<Value>,
    pub analytics: Option<Value>,
}

/// Inserts a response row and returns its id.
pub async fn create_response(pool: &PgPool, new: NewResponse) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO responses
            (interview_id, call_id, name, email, is_ended, is_analysed,
             is_viewed, candidate_status, duration, tab_switch_count, details, analytics)
        VALUES ($1, $2, $3, $4, $5, $6, false, $7, 0, 0, $8, $9)
        RETURNING id
        "#,
    )
    .bind(&new.interview_id)
    .bind(&new.call_id)
    .bind(&new.name)
    .bind(&new.email)
    .bind(new.is_ended)
    .bind(new.is_analysed)
    .bind(CandidateStatus::default().as_str())
    .bind(&new.details)
    .bind(&new.analytics)
    .fetch_one(pool)
    .await?;

    info!("Created response {id} for call {}", new.call_id);
    Ok(id)
}

/// Inserts a response row unless one already exists for the call id.
/// Returns `None` when the call was already known. This is what keeps
/// repeated `call_started` webhooks from duplicating rows.
pub async fn create_response_if_absent(
    pool: &PgPool,
    new: NewResponse,
) -> Result<Option<i64>, sqlx::Error> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM responses WHERE call_id = $1")
        .bind(&new.call_id)
        .fetch_optional(pool)
        .await?;

    if let Some((id,)) = existing {
        info!(
            "Response {id} already exists for call {}, skipping create",
            new.call_id
        );
        return Ok(None);
    }

    create_response(pool, new).await.map(Some)
}

/// Applies a partial update to the response with this call id.
pub async fn save_response(
    pool: &PgPool,
    update: ResponseUpdate,
    call_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE responses SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            is_ended = COALESCE($4, is_ended),
            is_analysed = COALESCE($5, is_analysed),
            is_viewed = COALESCE($6, is_viewed),
            candidate_status = COALESCE($7, candidate_status),
            duration = COALESCE($8, duration),
            tab_switch_count = COALESCE($9, tab_switch_count),
            details = COALESCE($10, details),
            analytics = COALESCE($11, analytics)
        WHERE call_id = $1
        "#,
    )
    .bind(call_id)
    .bind(&update.name)
    .bind(&update.email)
    .bind(update.is_ended)
    .bind(update.is_analysed)
    .bind(update.is_viewed)
    .bind(update.candidate_status.map(|s| s.as_str()))
    .bind(update.duration)
    .bind(update.tab_switch_count)
    .bind(&update.details)
    .bind(&update.analytics)
    .execute(pool)
    .await?;

    Ok(())
}

/// All responses for an interview, newest first.
pub async fn get_all_responses(
    pool: &PgPool,
    interview_id: &str,
) -> Result<Vec<ResponseRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM responses WHERE interview_id = $1 ORDER BY created_at DESC")
        .bind(interview_id)
        .fetch_all(pool)
        .await
}

/// Emails already seen for an interview; used by the duplicate-respondent
/// check before a real session starts.
pub async fn get_all_emails(pool: &PgPool, interview_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT email FROM responses WHERE interview_id = $1 AND email IS NOT NULL",
    )
    .bind(interview_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(email,)| email).collect())
}

/// Call ids already stored for an interview; the backfill diff base.
pub async fn get_call_ids(pool: &PgPool, interview_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT call_id FROM responses WHERE interview_id = $1")
        .bind(interview_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(call_id,)| call_id).collect())
}

pub async fn get_response_by_call_id(
    pool: &PgPool,
    call_id: &str,
) -> Result<Option<ResponseRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM responses WHERE call_id = $1")
        .bind(call_id)
        .fetch_optional(pool)
        .await
}

/// Hard delete, only reachable from an explicit user action in the dashboard.
pub async fn delete_response(pool: &PgPool, call_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM responses WHERE call_id = $1")
        .bind(call_id)
        .execute(pool)
        .await?;
    Ok(())
}
