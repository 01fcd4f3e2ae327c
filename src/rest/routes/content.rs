// rest/routes/content.rs — Template-based content generation.

use crate::{content, error::ApiError, rest::auth::AuthedAccount, AppContext};
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    #[serde(default = "default_outline_mode")]
    pub outline: String,
}

fn default_outline_mode() -> String {
    content::AUTO_OUTLINE.to_string()
}

pub async fn generate(
    State(ctx): State<Arc<AppContext>>,
    AuthedAccount(_account_id): AuthedAccount,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let document = content::generate(&body.topic, &body.outline);
    ctx.metrics.inc_content_generated();
    Ok(Json(json!({ "content": document })))
}
