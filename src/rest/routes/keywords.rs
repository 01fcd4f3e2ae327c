// rest/routes/keywords.rs — Keyword research.

use crate::{error::ApiError, rest::auth::AuthedAccount, AppContext};
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub keyword: String,
}

pub async fn analyze(
    State(ctx): State<Arc<AppContext>>,
    AuthedAccount(_account_id): AuthedAccount,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<Value>, ApiError> {
    let analysis = ctx.analyzer.analyze(&body.keyword).await?;
    ctx.metrics.inc_keyword_analyses();
    Ok(Json(serde_json::to_value(analysis).map_err(|e| {
        ApiError::Internal(e.into())
    })?))
}
