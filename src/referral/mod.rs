// referral/mod.rs — Referral codes, attribution, and reward grants.

use crate::{
    credits::{CreditLedger, KIND_BONUS},
    error::ApiError,
    storage::{ReferralRow, ReferredUserRow, Storage},
};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Credits for the referrer on each successful referral.
pub const REFERRER_CREDITS: i64 = 50;
/// Welcome credits for the referred account.
pub const REFEREE_CREDITS: i64 = 25;
/// Referral count at which the one-time milestone bonus fires.
pub const BONUS_THRESHOLD: i64 = 5;
/// Milestone bonus amount.
pub const BONUS_CREDITS: i64 = 100;

const CODE_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draw one candidate code, uniform per character over the fixed alphabet.
pub fn draw_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralStats {
    pub referral_code: String,
    pub total_referrals: i64,
    pub total_credits_earned: i64,
    pub referred_users: Vec<ReferredUserRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareContent {
    pub twitter: String,
    pub linkedin: String,
    pub email_subject: String,
    pub email_body: String,
}

#[derive(Clone)]
pub struct ReferralService {
    storage: Arc<Storage>,
    ledger: CreditLedger,
    /// Base URL for shareable signup links (the web client's origin).
    client_url: String,
}

impl ReferralService {
    pub fn new(storage: Arc<Storage>, ledger: CreditLedger, client_url: String) -> Self {
        Self {
            storage,
            ledger,
            client_url,
        }
    }

    /// Generate a unique 8-character code and persist the referral record.
    ///
    /// Collisions are vanishingly rare at 36^8 but the whole-code retry loop
    /// is required for correctness, not luck. Losing an insert race for the
    /// same account returns the record the winner created.
    pub async fn create_code(&self, account_id: &str) -> Result<ReferralRow, ApiError> {
        loop {
            let candidate = draw_code();
            if self.storage.referral_code_exists(&candidate).await? {
                continue;
            }
            match self.storage.insert_referral(account_id, &candidate).await {
                Ok(record) => {
                    info!(account_id, code = %candidate, "referral code created");
                    return Ok(record);
                }
                Err(ApiError::Database(e))
                    if e.as_database_error()
                        .is_some_and(|d| d.is_unique_violation()) =>
                {
                    // Either a concurrent call already created this account's
                    // record, or the code itself collided. Re-read; a missing
                    // record means a code collision, so draw again.
                    if let Some(existing) = self.storage.get_referral(account_id).await? {
                        return Ok(existing);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Stats for an account. Returns a zero-valued synthetic record with an
    /// empty code when the account has no referral record yet; callers create
    /// one lazily.
    pub async fn stats(&self, account_id: &str) -> Result<ReferralStats, ApiError> {
        match self.storage.get_referral(account_id).await? {
            Some(record) => {
                let referred_users = self.storage.list_referred_users(account_id).await?;
                Ok(ReferralStats {
                    referral_code: record.code,
                    total_referrals: record.total_referrals,
                    total_credits_earned: record.total_credits_earned,
                    referred_users,
                })
            }
            None => Ok(ReferralStats {
                referral_code: String::new(),
                total_referrals: 0,
                total_credits_earned: 0,
                referred_users: Vec::new(),
            }),
        }
    }

    /// Attribute a signup to a referral code and grant rewards to both sides.
    ///
    /// Idempotent against duplicate submission: a second call with the same
    /// (code, account) pair fails with `AlreadyReferred` and grants nothing.
    /// The milestone bonus fires exactly when the running total *equals* the
    /// threshold on this call — an equality check so repeated calls past the
    /// threshold can never re-grant it.
    pub async fn process_referral(
        &self,
        code: &str,
        new_account_id: &str,
    ) -> Result<ReferralRow, ApiError> {
        let referral = self
            .storage
            .get_referral_by_code(code)
            .await?
            .ok_or(ApiError::InvalidCode)?;

        if self
            .storage
            .is_already_referred(&referral.account_id, new_account_id)
            .await?
        {
            return Err(ApiError::AlreadyReferred);
        }

        // Grants run before the referral record is persisted: a failed grant
        // (e.g. unknown referee account) must leave the totals untouched so a
        // retry is not poisoned by the duplicate guard.
        self.ledger
            .add_credits(
                new_account_id,
                REFEREE_CREDITS,
                KIND_BONUS,
                "Welcome bonus for joining via referral",
            )
            .await?;
        self.ledger
            .add_credits(
                &referral.account_id,
                REFERRER_CREDITS,
                KIND_BONUS,
                "Referral bonus for inviting a new user",
            )
            .await?;

        let updated = self
            .storage
            .record_referred_user(&referral.account_id, new_account_id, REFERRER_CREDITS)
            .await?;

        if updated.total_referrals == BONUS_THRESHOLD {
            self.ledger
                .add_credits(
                    &referral.account_id,
                    BONUS_CREDITS,
                    KIND_BONUS,
                    &format!("Bonus for reaching {BONUS_THRESHOLD} referrals!"),
                )
                .await?;
            self.storage
                .add_referral_earnings(&referral.account_id, BONUS_CREDITS)
                .await?;
            info!(
                referrer = %referral.account_id,
                "referral milestone bonus granted"
            );
        }

        info!(
            referrer = %referral.account_id,
            referred = new_account_id,
            total = updated.total_referrals,
            "referral processed"
        );
        self.storage
            .get_referral(&referral.account_id)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("referral vanished mid-update")))
    }

    /// Shareable signup link. Pure formatting.
    pub fn shareable_link(&self, code: &str) -> String {
        format!("{}/signup?ref={code}", self.client_url)
    }

    /// Canned social-share copy for the referral link. Pure formatting.
    pub fn social_share_content(&self, code: &str) -> ShareContent {
        let link = self.shareable_link(code);
        ShareContent {
            twitter: format!(
                "Generate SEO-optimized content for free! Join SEOmnissiah using my referral \
                 link and get {REFEREE_CREDITS} free credits: {link} #SEO #ContentCreation"
            ),
            linkedin: format!(
                "I've been using SEOmnissiah to generate SEO-optimized content, and it's been \
                 a game-changer! Join using my referral link to get {REFEREE_CREDITS} free \
                 credits: {link}"
            ),
            email_subject: "Get Free SEO Content Generation Credits".to_string(),
            email_body: format!(
                "Hey,\n\nI wanted to share this amazing tool I've been using for SEO content \
                 generation. Join SEOmnissiah using my referral link and get {REFEREE_CREDITS} \
                 free credits to try it out:\n\n{link}\n\nEnjoy!"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_eight_chars_from_the_fixed_alphabet() {
        for _ in 0..1000 {
            let code = draw_code();
            assert_eq!(code.len(), 8);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn share_link_embeds_code_and_base_url() {
        let link = format!("{}/signup?ref={}", "https://seomnissiah.com", "AB12CD34");
        assert_eq!(link, "https://seomnissiah.com/signup?ref=AB12CD34");
    }
}
