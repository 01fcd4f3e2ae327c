// rest/routes/referral.rs — Referral stats and signup attribution.

use crate::{error::ApiError, rest::auth::AuthedAccount, AppContext};
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Stats for the calling account. A referral code is created lazily on the
/// first stats request.
pub async fn stats(
    State(ctx): State<Arc<AppContext>>,
    AuthedAccount(account_id): AuthedAccount,
) -> Result<Json<Value>, ApiError> {
    let mut stats = ctx.referrals.stats(&account_id).await?;
    if stats.referral_code.is_empty() {
        ctx.referrals.create_code(&account_id).await?;
        stats = ctx.referrals.stats(&account_id).await?;
    }

    let referral_link = ctx.referrals.shareable_link(&stats.referral_code);
    let share_content = ctx.referrals.social_share_content(&stats.referral_code);

    Ok(Json(json!({
        "referralCode": stats.referral_code,
        "totalReferrals": stats.total_referrals,
        "totalCreditsEarned": stats.total_credits_earned,
        "referredUsers": stats.referred_users,
        "referralLink": referral_link,
        "shareContent": share_content,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub referral_code: String,
}

/// Attribute the calling account's signup to a referral code.
pub async fn process(
    State(ctx): State<Arc<AppContext>>,
    AuthedAccount(account_id): AuthedAccount,
    Json(body): Json<ProcessRequest>,
) -> Result<Json<Value>, ApiError> {
    ctx.referrals
        .process_referral(&body.referral_code, &account_id)
        .await?;
    ctx.metrics.inc_referrals_processed();
    Ok(Json(json!({ "creditsAwarded": true })))
}
