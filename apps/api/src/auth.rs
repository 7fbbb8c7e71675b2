//! Session boundary. Authentication itself is delegated to the identity
//! proxy in front of this API; it injects `x-user-id` and `x-org-id` headers
//! after validating the dashboard session. Routes that extract
//! [`AuthSession`] short-circuit with 401 before any business logic runs.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ORG_ID_HEADER: &str = "x-org-id";

/// The authenticated dashboard user and their organization.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: String,
    pub org_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = non_empty_header(parts, USER_ID_HEADER)?;
        let org_id = non_empty_header(parts, ORG_ID_HEADER)?;
        Ok(AuthSession { user_id, org_id })
    }
}

fn non_empty_header(parts: &Parts, name: &str) -> Result<String, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(String::from)
        .ok_or(AppError::Unauthorized)
}
