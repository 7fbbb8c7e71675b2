use sqlx::PgPool;

use crate::models::interviewer::InterviewerRow;

pub async fn get_interviewer(
    pool: &PgPool,
    interviewer_id: i64,
) -> Result<Option<InterviewerRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM interviewers WHERE id = $1")
        .bind(interviewer_id)
        .fetch_optional(pool)
        .await
}
