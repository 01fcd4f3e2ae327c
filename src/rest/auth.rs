// rest/auth.rs — Request authentication extractors.
//
// Identity is owned by an external auth service; by the time a request
// reaches us the bearer token has been validated upstream and carries the
// account id. The extractor here only requires the header and lifts the id
// out — it never re-verifies identity.

use crate::{error::ApiError, AppContext};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

const ADMIN_HEADER: &str = "x-admin-token";

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// The calling account, extracted from `Authorization: Bearer <account-id>`.
pub struct AuthedAccount(pub String);

impl<S> FromRequestParts<S> for AuthedAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_token(parts)
            .map(AuthedAccount)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Gate for admin routes: requires the configured admin token in the
/// `x-admin-token` header. When no token is configured the check is skipped
/// (trusted local deployments).
pub struct AdminGate;

impl FromRequestParts<Arc<AppContext>> for AdminGate {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.config.admin_token else {
            return Ok(AdminGate);
        };
        let supplied = parts
            .headers
            .get(ADMIN_HEADER)
            .and_then(|v| v.to_str().ok());
        if supplied == Some(expected.as_str()) {
            Ok(AdminGate)
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}
