// rest/routes/admin.rs — Admin credit-gifting panel.

use crate::{
    credits::gifting::GiftCampaign,
    error::ApiError,
    rest::auth::AdminGate,
    AppContext,
};
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn gift_credits(
    State(ctx): State<Arc<AppContext>>,
    _gate: AdminGate,
    Json(campaign): Json<GiftCampaign>,
) -> Result<Json<Value>, ApiError> {
    let results = ctx.gifts.create_campaign(&campaign).await?;
    let granted = results.iter().filter(|r| r.success).count() as u64;
    ctx.metrics
        .add_credits_gifted(granted * campaign.credit_amount.max(0) as u64);
    Ok(Json(json!({ "results": results })))
}

pub async fn gift_stats(
    State(ctx): State<Arc<AppContext>>,
    _gate: AdminGate,
) -> Result<Json<Value>, ApiError> {
    let stats = ctx.gifts.gifting_stats().await?;
    Ok(Json(json!({
        "totalGifted": stats.total_gifted,
        "giftCount": stats.gift_count,
        "avgGiftAmount": stats.avg_gift_amount,
    })))
}
