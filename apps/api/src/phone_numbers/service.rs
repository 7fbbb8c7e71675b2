//! Phone-number CRUD and provider coordination.
//!
//! Link and unlink perform two independent writes (provider first, then the
//! local row) with no compensating transaction; on partial failure the two
//! systems diverge until a backfill pass reconciles the calls themselves.

use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::phone_number::PhoneNumberRow;
use crate::voice::{PhoneNumberUpdate, VoiceProvider};

pub const DEFAULT_LINK_NICKNAME: &str = "Interview Phone";

/// Area codes are exactly three ASCII digits.
pub fn is_valid_area_code(area_code: &str) -> bool {
    area_code.len() == 3 && area_code.bytes().all(|b| b.is_ascii_digit())
}

/// All numbers owned by an organization.
pub async fn get_phone_numbers(
    pool: &PgPool,
    organization_id: &str,
) -> Result<Vec<PhoneNumberRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM phone_numbers WHERE organization_id = $1 ORDER BY created_at")
        .bind(organization_id)
        .fetch_all(pool)
        .await
}

pub async fn get_phone_number_by_id(
    pool: &PgPool,
    phone_number_id: i64,
) -> Result<Option<PhoneNumberRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM phone_numbers WHERE id = $1")
        .bind(phone_number_id)
        .fetch_optional(pool)
        .await
}

/// Interview linked to an exact E.164 number, if any.
pub async fn interview_for_number(
    pool: &PgPool,
    number: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT interview_id FROM phone_numbers WHERE number = $1")
            .bind(number)
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(interview_id,)| interview_id))
}

/// Interview linked to a provider agent, if any.
pub async fn interview_for_agent(
    pool: &PgPool,
    agent_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT interview_id FROM phone_numbers WHERE agent_linked = $1")
            .bind(agent_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(interview_id,)| interview_id))
}

/// Provisions a number in the given area code and stores it as available.
/// The row is persisted before this returns, so the dashboard sees it on the
/// next list.
pub async fn acquire_phone_number(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    organization_id: &str,
    area_code: u16,
    nickname: Option<String>,
) -> Result<PhoneNumberRow, AppError> {
    let provisioned = voice.create_phone_number(area_code).await?;
    info!("Provider provisioned number {}", provisioned.phone_number);

    let row: PhoneNumberRow = sqlx::query_as(
        r#"
        INSERT INTO phone_numbers (number, organization_id, nickname, is_available)
        VALUES ($1, $2, $3, true)
        RETURNING *
        "#,
    )
    .bind(&provisioned.phone_number)
    .bind(organization_id)
    .bind(&nickname)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Binds a number to an (interview, agent) pair: provider update first
/// (inbound agent + webhook registration), then the local link fields.
pub async fn link_phone_number(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    config: &Config,
    phone_number_id: i64,
    agent_id: &str,
    interview_id: &str,
) -> Result<PhoneNumberRow, AppError> {
    let phone_number = get_phone_number_by_id(pool, phone_number_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Phone number {phone_number_id} not found")))?;

    let webhook_url = config.webhook_url();
    info!(
        "Linking number {} to agent {agent_id} (webhook {webhook_url})",
        phone_number.number
    );

    voice
        .update_phone_number(
            &phone_number.number,
            PhoneNumberUpdate {
                inbound_agent_id: Some(agent_id.to_string()),
                nickname: Some(
                    phone_number
                        .nickname
                        .clone()
                        .unwrap_or_else(|| DEFAULT_LINK_NICKNAME.to_string()),
                ),
                webhook_url: Some(webhook_url),
                metadata: Some(serde_json::json!({
                    "interview_id": interview_id,
                    "phone_number": phone_number.number,
                })),
            },
        )
        .await?;

    let row: PhoneNumberRow = sqlx::query_as(
        r#"
        UPDATE phone_numbers
        SET is_available = false, agent_linked = $2, interview_id = $3
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(phone_number_id)
    .bind(agent_id)
    .bind(interview_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Clears the provider's inbound-agent assignment, then the local link.
pub async fn unlink_phone_number(
    pool: &PgPool,
    voice: &dyn VoiceProvider,
    phone_number_id: i64,
) -> Result<PhoneNumberRow, AppError> {
    let phone_number = get_phone_number_by_id(pool, phone_number_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Phone number {phone_number_id} not found")))?;

    voice
        .update_phone_number(
            &phone_number.number,
            PhoneNumberUpdate {
                // Empty string clears the binding on the provider side.
                inbound_agent_id: Some(String::new()),
                ..Default::default()
            },
        )
        .await?;

    let row: PhoneNumberRow = sqlx::query_as(
        r#"
        UPDATE phone_numbers
        SET is_available = true, agent_linked = NULL, interview_id = NULL
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(phone_number_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_ascii_digits_is_valid() {
        assert!(is_valid_area_code("415"));
        assert!(is_valid_area_code("020"));
    }

    #[test]
    fn wrong_length_or_non_digits_are_invalid() {
        assert!(!is_valid_area_code(""));
        assert!(!is_valid_area_code("41"));
        assert!(!is_valid_area_code("4155"));
        assert!(!is_valid_area_code("41a"));
        assert!(!is_valid_area_code("４１５")); // full-width digits are not ASCII
    }
}
