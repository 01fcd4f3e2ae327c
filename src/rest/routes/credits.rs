// rest/routes/credits.rs — Credit balance, checkout, spend, and the payment
// provider webhook.

use crate::{error::ApiError, rest::auth::AuthedAccount, AppContext};
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub package: String,
}

pub async fn checkout(
    State(ctx): State<Arc<AppContext>>,
    AuthedAccount(account_id): AuthedAccount,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<Value>, ApiError> {
    let session = ctx.checkout.create_session(&account_id, &body.package).await?;
    Ok(Json(json!({ "sessionId": session.id })))
}

/// Payment-provider "checkout completed" event. Delivered by the provider,
/// not by a user session — signature verification happens at the provider
/// gateway before it reaches us.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    pub account_id: String,
    pub credit_amount: i64,
    #[serde(default)]
    pub session_id: Option<String>,
}

pub async fn webhook(
    State(ctx): State<Arc<AppContext>>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<Value>, ApiError> {
    ctx.checkout
        .handle_completed(
            &event.account_id,
            event.credit_amount,
            event.session_id.as_deref(),
        )
        .await?;
    ctx.metrics
        .add_credits_purchased(event.credit_amount.max(0) as u64);
    Ok(Json(json!({ "received": true })))
}

pub async fn balance(
    State(ctx): State<Arc<AppContext>>,
    AuthedAccount(account_id): AuthedAccount,
) -> Result<Json<Value>, ApiError> {
    let balance = ctx.ledger.get_balance(&account_id).await?;
    Ok(Json(json!({ "balance": balance })))
}

#[derive(Deserialize)]
pub struct UseCreditsRequest {
    pub amount: i64,
    #[serde(default)]
    pub description: String,
}

pub async fn use_credits(
    State(ctx): State<Arc<AppContext>>,
    AuthedAccount(account_id): AuthedAccount,
    Json(body): Json<UseCreditsRequest>,
) -> Result<Json<Value>, ApiError> {
    let ledger = ctx
        .ledger
        .use_credits(&account_id, body.amount, &body.description)
        .await?;
    ctx.metrics.add_credits_spent(body.amount.max(0) as u64);

    // Promotional draw — advisory only, a failure here never fails the spend.
    let lucky = match ctx
        .gifts
        .check_and_trigger_lucky_bonus(&account_id, ledger.balance)
        .await
    {
        Ok(grant) => grant,
        Err(e) => {
            warn!(account_id = %account_id, "lucky bonus check failed: {e}");
            None
        }
    };

    let balance = match &lucky {
        Some(grant) => ledger.balance + grant.amount,
        None => ledger.balance,
    };
    Ok(Json(json!({ "balance": balance, "lucky": lucky })))
}
