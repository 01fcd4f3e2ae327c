//! Referral program: code generation, reward grants, duplicate-submission
//! idempotency, and the one-shot milestone bonus.

use seomnid::{
    credits::CreditLedger,
    error::ApiError,
    referral::{ReferralService, BONUS_CREDITS, REFEREE_CREDITS, REFERRER_CREDITS},
    storage::Storage,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn make_services(dir: &TempDir) -> (Arc<Storage>, CreditLedger, ReferralService) {
    let storage = Arc::new(Storage::new(dir.path()).await.unwrap());
    let ledger = CreditLedger::new(storage.clone());
    let referrals = ReferralService::new(
        storage.clone(),
        ledger.clone(),
        "https://seomnissiah.test".to_string(),
    );
    (storage, ledger, referrals)
}

#[tokio::test]
async fn code_creation_and_lazy_stats() {
    let dir = TempDir::new().unwrap();
    let (storage, _ledger, referrals) = make_services(&dir).await;
    let account = storage.create_account("r@example.com", "new").await.unwrap();

    // Before a code exists, stats are a zero-valued synthetic record.
    let stats = referrals.stats(&account.id).await.unwrap();
    assert!(stats.referral_code.is_empty());
    assert_eq!(stats.total_referrals, 0);

    let record = referrals.create_code(&account.id).await.unwrap();
    assert_eq!(record.code.len(), 8);
    assert!(record
        .code
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));

    let stats = referrals.stats(&account.id).await.unwrap();
    assert_eq!(stats.referral_code, record.code);
}

#[tokio::test]
async fn processing_grants_both_sides() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger, referrals) = make_services(&dir).await;
    let referrer = storage.create_account("ref@example.com", "loyal").await.unwrap();
    let newbie = storage.create_account("new@example.com", "new").await.unwrap();
    let record = referrals.create_code(&referrer.id).await.unwrap();

    let updated = referrals
        .process_referral(&record.code, &newbie.id)
        .await
        .unwrap();

    assert_eq!(updated.total_referrals, 1);
    assert_eq!(updated.total_credits_earned, REFERRER_CREDITS);
    assert_eq!(
        ledger.get_balance(&referrer.id).await.unwrap(),
        REFERRER_CREDITS
    );
    assert_eq!(ledger.get_balance(&newbie.id).await.unwrap(), REFEREE_CREDITS);

    let stats = referrals.stats(&referrer.id).await.unwrap();
    assert_eq!(stats.referred_users.len(), 1);
    assert_eq!(stats.referred_users[0].referred_id, newbie.id);
}

#[tokio::test]
async fn duplicate_submission_is_rejected_without_double_grant() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger, referrals) = make_services(&dir).await;
    let referrer = storage.create_account("ref@example.com", "loyal").await.unwrap();
    let newbie = storage.create_account("new@example.com", "new").await.unwrap();
    let record = referrals.create_code(&referrer.id).await.unwrap();

    referrals.process_referral(&record.code, &newbie.id).await.unwrap();
    let err = referrals
        .process_referral(&record.code, &newbie.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AlreadyReferred));

    // Balances and totals are exactly one grant's worth.
    assert_eq!(
        ledger.get_balance(&referrer.id).await.unwrap(),
        REFERRER_CREDITS
    );
    assert_eq!(ledger.get_balance(&newbie.id).await.unwrap(), REFEREE_CREDITS);
    let stats = referrals.stats(&referrer.id).await.unwrap();
    assert_eq!(stats.total_referrals, 1);
}

#[tokio::test]
async fn repeated_code_creation_returns_the_existing_record() {
    let dir = TempDir::new().unwrap();
    let (storage, _ledger, referrals) = make_services(&dir).await;
    let account = storage.create_account("r@example.com", "new").await.unwrap();

    let record = referrals.create_code(&account.id).await.unwrap();
    let again = referrals.create_code(&account.id).await.unwrap();
    assert_eq!(again.code, record.code);

    // Concurrent first calls settle on one code; the loser of the insert
    // race gets the winner's record instead of a constraint error.
    let other = storage.create_account("s@example.com", "new").await.unwrap();
    let r1 = referrals.clone();
    let r2 = referrals.clone();
    let id1 = other.id.clone();
    let id2 = other.id.clone();
    let (a, b) = tokio::join!(
        async move { r1.create_code(&id1).await },
        async move { r2.create_code(&id2).await },
    );
    assert_eq!(a.unwrap().code, b.unwrap().code);
}

#[tokio::test]
async fn failed_referee_grant_leaves_totals_and_retry_intact() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger, referrals) = make_services(&dir).await;
    let referrer = storage.create_account("ref@example.com", "loyal").await.unwrap();
    let record = referrals.create_code(&referrer.id).await.unwrap();

    // The referred account does not exist yet: the grant fails and nothing
    // may stick — no totals bump, no referrer credits, no referred row.
    let ghost = "not-yet-signed-up";
    let err = referrals.process_referral(&record.code, ghost).await.unwrap_err();
    assert!(matches!(err, ApiError::AccountNotFound(_)));

    let stats = referrals.stats(&referrer.id).await.unwrap();
    assert_eq!(stats.total_referrals, 0);
    assert_eq!(stats.total_credits_earned, 0);
    assert!(stats.referred_users.is_empty());
    assert_eq!(ledger.get_balance(&referrer.id).await.unwrap(), 0);

    // Once the account exists, the very same submission goes through.
    sqlx::query("INSERT INTO accounts (id, email, status, created_at) VALUES (?, ?, 'new', ?)")
        .bind(ghost)
        .bind("ghost@example.com")
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&storage.pool())
        .await
        .unwrap();
    referrals.process_referral(&record.code, ghost).await.unwrap();
    assert_eq!(ledger.get_balance(ghost).await.unwrap(), REFEREE_CREDITS);
    assert_eq!(ledger.get_balance(&referrer.id).await.unwrap(), REFERRER_CREDITS);
}

#[tokio::test]
async fn unknown_code_is_invalid() {
    let dir = TempDir::new().unwrap();
    let (storage, _ledger, referrals) = make_services(&dir).await;
    let newbie = storage.create_account("new@example.com", "new").await.unwrap();

    let err = referrals
        .process_referral("NOPE0000", &newbie.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidCode));
}

#[tokio::test]
async fn milestone_bonus_fires_exactly_once() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger, referrals) = make_services(&dir).await;
    let referrer = storage.create_account("ref@example.com", "loyal").await.unwrap();
    let record = referrals.create_code(&referrer.id).await.unwrap();

    for i in 0..7i64 {
        let newbie = storage
            .create_account(&format!("n{i}@example.com"), "new")
            .await
            .unwrap();
        referrals.process_referral(&record.code, &newbie.id).await.unwrap();

        let expected = REFERRER_CREDITS * (i + 1)
            + if i + 1 >= 5 { BONUS_CREDITS } else { 0 };
        assert_eq!(
            ledger.get_balance(&referrer.id).await.unwrap(),
            expected,
            "after referral {}",
            i + 1
        );
    }

    // 7 referrals: 7×50 + one 100 bonus, never two.
    let stats = referrals.stats(&referrer.id).await.unwrap();
    assert_eq!(stats.total_referrals, 7);
    assert_eq!(
        stats.total_credits_earned,
        7 * REFERRER_CREDITS + BONUS_CREDITS
    );
}

#[tokio::test]
async fn share_content_embeds_the_link() {
    let dir = TempDir::new().unwrap();
    let (_storage, _ledger, referrals) = make_services(&dir).await;

    let link = referrals.shareable_link("AB12CD34");
    assert_eq!(link, "https://seomnissiah.test/signup?ref=AB12CD34");

    let content = referrals.social_share_content("AB12CD34");
    assert!(content.twitter.contains(&link));
    assert!(content.linkedin.contains(&link));
    assert!(content.email_body.contains(&link));
    assert!(content.twitter.contains("25 free credits"));
}
