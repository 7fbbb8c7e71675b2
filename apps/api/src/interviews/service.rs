use sqlx::PgPool;

use crate::models::interview::InterviewRow;

pub async fn get_interview_by_id(
    pool: &PgPool,
    interview_id: &str,
) -> Result<Option<InterviewRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM interviews WHERE id = $1")
        .bind(interview_id)
        .fetch_optional(pool)
        .await
}

/// Binds a provider agent to an interview (set when the dashboard finishes
/// configuring the interviewer).
pub async fn update_interview_agent(
    pool: &PgPool,
    interview_id: &str,
    agent_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE interviews SET agent_id = $2 WHERE id = $1")
        .bind(interview_id)
        .bind(agent_id)
        .execute(pool)
        .await?;
    Ok(())
}
