// credits/gifting.rs — Admin credit gifting + promotional lucky bonus.
//
// Bulk grants fan out per account with failure isolation: one missing ledger
// never aborts the rest of the batch, and the result list always matches the
// input list in length and order.

use crate::{error::ApiError, storage::Storage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::{CreditLedger, KIND_BONUS, KIND_GIFT};

/// Lucky bonus only applies while an account is still "new": at most this
/// many transactions on the ledger.
const LUCKY_NEW_ACCOUNT_TXN_LIMIT: i64 = 5;
/// Balance at or below which the lucky draw happens.
const LUCKY_BALANCE_THRESHOLD: i64 = 5;
/// Probability of a grant once eligible.
const LUCKY_CHANCE: f64 = 0.7;
/// Granted amount is uniform in this inclusive range.
const LUCKY_MIN: i64 = 5;
const LUCKY_MAX: i64 = 10;

/// Closed set of campaign targeting criteria, resolved through the account
/// store's status field. Replaces free-form filter objects on purpose: the
/// gift service never interprets query semantics itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    New,
    Inactive,
    Loyal,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::New => "new",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Loyal => "loyal",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftCampaign {
    #[serde(default)]
    pub target_users: Vec<String>,
    #[serde(default)]
    pub criteria: Option<AccountStatus>,
    pub credit_amount: i64,
    pub reason: String,
}

/// Per-account outcome of a bulk gift. Order matches the input id list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftOutcome {
    pub account_id: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LuckyGrant {
    pub granted: bool,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GiftingStats {
    pub total_gifted: i64,
    pub gift_count: i64,
    pub avg_gift_amount: f64,
}

#[derive(Clone)]
pub struct GiftService {
    storage: Arc<Storage>,
    ledger: CreditLedger,
}

impl GiftService {
    pub fn new(storage: Arc<Storage>, ledger: CreditLedger) -> Self {
        Self { storage, ledger }
    }

    /// Gift credits to a single account. Unlike purchases, gifting requires
    /// an existing ledger — gifting to an account that never held credits is
    /// rejected with `LedgerNotFound`.
    pub async fn gift_to_user(
        &self,
        account_id: &str,
        amount: i64,
        reason: &str,
    ) -> Result<(), ApiError> {
        if self.storage.get_ledger(account_id).await?.is_none() {
            return Err(ApiError::LedgerNotFound(account_id.to_string()));
        }
        self.ledger
            .add_credits(account_id, amount, KIND_GIFT, reason)
            .await?;
        Ok(())
    }

    /// Gift to every id independently; failures are isolated per id and
    /// reported in the returned list, input order preserved.
    pub async fn gift_to_many(
        &self,
        account_ids: &[String],
        amount: i64,
        reason: &str,
    ) -> Result<Vec<GiftOutcome>, ApiError> {
        let mut outcomes = Vec::with_capacity(account_ids.len());
        for account_id in account_ids {
            let outcome = match self.gift_to_user(account_id, amount, reason).await {
                Ok(()) => GiftOutcome {
                    account_id: account_id.clone(),
                    success: true,
                    error: None,
                },
                Err(e) => GiftOutcome {
                    account_id: account_id.clone(),
                    success: false,
                    error: Some(e.to_string()),
                },
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Resolve a status criteria to concrete account ids, then bulk gift.
    pub async fn gift_by_criteria(
        &self,
        criteria: AccountStatus,
        amount: i64,
        reason: &str,
    ) -> Result<Vec<GiftOutcome>, ApiError> {
        let ids = self
            .storage
            .find_account_ids_by_status(criteria.as_str())
            .await?;
        self.gift_to_many(&ids, amount, reason).await
    }

    /// Run a gift campaign. Criteria and explicit target list are mutually
    /// exclusive selector modes; criteria wins when both are present.
    pub async fn create_campaign(
        &self,
        campaign: &GiftCampaign,
    ) -> Result<Vec<GiftOutcome>, ApiError> {
        if let Some(criteria) = campaign.criteria {
            return self
                .gift_by_criteria(criteria, campaign.credit_amount, &campaign.reason)
                .await;
        }
        if !campaign.target_users.is_empty() {
            return self
                .gift_to_many(&campaign.target_users, campaign.credit_amount, &campaign.reason)
                .await;
        }
        Err(ApiError::InvalidCampaign)
    }

    /// Promotional lucky-bonus draw, invoked after a successful spend.
    ///
    /// Advisory only — a failed or skipped draw never affects the spend that
    /// triggered it. Eligibility: a "new" ledger (txn_count <= 5) sitting at
    /// a balance of 5 or fewer credits.
    pub async fn check_and_trigger_lucky_bonus(
        &self,
        account_id: &str,
        current_balance: i64,
    ) -> Result<Option<LuckyGrant>, ApiError> {
        let Some(ledger) = self.storage.get_ledger(account_id).await? else {
            return Ok(None);
        };
        if ledger.txn_count > LUCKY_NEW_ACCOUNT_TXN_LIMIT
            || current_balance > LUCKY_BALANCE_THRESHOLD
        {
            return Ok(None);
        }

        let (wins, amount) = {
            let mut rng = rand::thread_rng();
            (rng.gen_bool(LUCKY_CHANCE), rng.gen_range(LUCKY_MIN..=LUCKY_MAX))
        };
        if !wins {
            return Ok(None);
        }

        self.ledger
            .add_credits(account_id, amount, KIND_BONUS, "Lucky bonus credits!")
            .await?;
        info!(account_id, amount, "lucky bonus granted");
        Ok(Some(LuckyGrant {
            granted: true,
            amount,
        }))
    }

    /// Aggregate gifting statistics across all ledgers. All zeros when no
    /// gift transaction exists — the average never divides by zero.
    pub async fn gifting_stats(&self) -> Result<GiftingStats, ApiError> {
        let (total_gifted, gift_count, avg_gift_amount) = self.storage.gift_stats().await?;
        if gift_count == 0 {
            warn!("gifting stats requested before any gift was issued");
        }
        Ok(GiftingStats {
            total_gifted,
            gift_count,
            avg_gift_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_status_round_trips_through_serde() {
        let parsed: AccountStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(parsed, AccountStatus::Inactive);
        assert_eq!(parsed.as_str(), "inactive");
    }

    #[test]
    fn campaign_deserializes_with_optional_fields() {
        let campaign: GiftCampaign = serde_json::from_str(
            r#"{"criteria": "loyal", "creditAmount": 25, "reason": "thanks"}"#,
        )
        .unwrap();
        assert_eq!(campaign.criteria, Some(AccountStatus::Loyal));
        assert!(campaign.target_users.is_empty());
    }
}
