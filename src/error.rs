// error.rs — API error taxonomy and HTTP mapping.
//
// Every service returns `Result<_, ApiError>`; the `IntoResponse` impl is the
// single place where domain failures become status codes. Bulk gifting never
// surfaces these per-account — failures there are collected per element.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("no credit ledger for account: {0}")]
    LedgerNotFound(String),

    #[error("insufficient credits: balance {balance}, requested {requested}")]
    InsufficientCredits { balance: i64, requested: i64 },

    #[error("credit amount must be a positive integer, got {0}")]
    InvalidAmount(i64),

    #[error("invalid campaign: provide either criteria or a non-empty target list")]
    InvalidCampaign,

    #[error("invalid referral code")]
    InvalidCode,

    #[error("user already referred")]
    AlreadyReferred,

    #[error("seed keyword must not be empty")]
    EmptyKeyword,

    #[error("unknown credit package: {0}")]
    InvalidPackage(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AccountNotFound(_) | ApiError::LedgerNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientCredits { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::InvalidAmount(_)
            | ApiError::InvalidCampaign
            | ApiError::InvalidCode
            | ApiError::AlreadyReferred
            | ApiError::EmptyKeyword
            | ApiError::InvalidPackage(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 5xx details stay in the logs, not in the response body.
        let message = if status.is_server_error() {
            tracing::error!("request failed: {self}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
