//! Credit ledger invariants: balance always equals the sum of transaction
//! amounts, and a rejected spend mutates nothing.

use seomnid::{credits::CreditLedger, error::ApiError, storage::Storage};
use std::sync::Arc;
use tempfile::TempDir;

async fn make_ledger(dir: &TempDir) -> (Arc<Storage>, CreditLedger) {
    let storage = Arc::new(Storage::new(dir.path()).await.unwrap());
    let ledger = CreditLedger::new(storage.clone());
    (storage, ledger)
}

async fn replay_sum(ledger: &CreditLedger, account_id: &str) -> i64 {
    ledger
        .transactions(account_id)
        .await
        .unwrap()
        .iter()
        .map(|t| t.amount)
        .sum()
}

#[tokio::test]
async fn purchase_then_spend_then_reject() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger) = make_ledger(&dir).await;
    let account = storage.create_account("a@example.com", "new").await.unwrap();

    // balance 0 → +50 purchase → 50, one transaction
    let l = ledger
        .add_credits(&account.id, 50, "purchase", "Purchased 50 credits")
        .await
        .unwrap();
    assert_eq!(l.balance, 50);
    assert_eq!(ledger.transactions(&account.id).await.unwrap().len(), 1);

    // -30 use → 20, two transactions
    let l = ledger.use_credits(&account.id, 30, "content").await.unwrap();
    assert_eq!(l.balance, 20);
    assert_eq!(ledger.transactions(&account.id).await.unwrap().len(), 2);

    // another -30 → rejected, nothing changes
    let err = ledger.use_credits(&account.id, 30, "content").await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::InsufficientCredits { balance: 20, requested: 30 }
    ));
    assert_eq!(ledger.get_balance(&account.id).await.unwrap(), 20);
    assert_eq!(ledger.transactions(&account.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn balance_always_equals_transaction_sum() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger) = make_ledger(&dir).await;
    let account = storage.create_account("b@example.com", "new").await.unwrap();

    ledger.add_credits(&account.id, 100, "purchase", "").await.unwrap();
    ledger.use_credits(&account.id, 40, "").await.unwrap();
    ledger.add_credits(&account.id, 25, "bonus", "").await.unwrap();
    ledger.use_credits(&account.id, 85, "").await.unwrap();
    ledger.add_credits(&account.id, 10, "refund", "").await.unwrap();
    // One rejected spend in the middle must not skew the sum.
    let _ = ledger.use_credits(&account.id, 999, "").await.unwrap_err();
    ledger.add_credits(&account.id, 5, "gift", "").await.unwrap();

    let balance = ledger.get_balance(&account.id).await.unwrap();
    assert_eq!(balance, 15);
    assert_eq!(replay_sum(&ledger, &account.id).await, balance);
}

#[tokio::test]
async fn transactions_keep_insertion_order() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger) = make_ledger(&dir).await;
    let account = storage.create_account("c@example.com", "new").await.unwrap();

    ledger.add_credits(&account.id, 10, "purchase", "first").await.unwrap();
    ledger.add_credits(&account.id, 20, "bonus", "second").await.unwrap();
    ledger.use_credits(&account.id, 5, "third").await.unwrap();

    let txns = ledger.transactions(&account.id).await.unwrap();
    let descriptions: Vec<&str> = txns.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["first", "second", "third"]);
    assert_eq!(txns[2].amount, -5);
    assert_eq!(txns[2].kind, "use");
}

#[tokio::test]
async fn non_positive_amounts_are_rejected_as_bad_requests() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger) = make_ledger(&dir).await;
    let account = storage.create_account("f@example.com", "new").await.unwrap();
    ledger.add_credits(&account.id, 50, "purchase", "").await.unwrap();

    for amount in [0, -5] {
        let err = ledger.use_credits(&account.id, amount, "").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidAmount(_)));
        assert_eq!(err.status().as_u16(), 400);
        let err = ledger
            .add_credits(&account.id, amount, "bonus", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidAmount(_)));
    }
    assert_eq!(ledger.get_balance(&account.id).await.unwrap(), 50);
    assert_eq!(ledger.transactions(&account.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_ledger_and_missing_account() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger) = make_ledger(&dir).await;

    // No ledger yet: balance reads 0 without error.
    let account = storage.create_account("d@example.com", "new").await.unwrap();
    assert_eq!(ledger.get_balance(&account.id).await.unwrap(), 0);

    // Spending from a non-existent ledger is LedgerNotFound, not a panic.
    let err = ledger.use_credits(&account.id, 1, "").await.unwrap_err();
    assert!(matches!(err, ApiError::LedgerNotFound(_)));

    // Crediting an unknown account is AccountNotFound.
    let err = ledger.add_credits("ghost", 10, "purchase", "").await.unwrap_err();
    assert!(matches!(err, ApiError::AccountNotFound(_)));
}

#[tokio::test]
async fn concurrent_spends_cannot_both_pass_the_guard() {
    let dir = TempDir::new().unwrap();
    let (storage, ledger) = make_ledger(&dir).await;
    let account = storage.create_account("e@example.com", "new").await.unwrap();
    ledger.add_credits(&account.id, 50, "purchase", "").await.unwrap();

    // Two racing 30-credit spends against a 50-credit balance: exactly one
    // may win.
    let l1 = ledger.clone();
    let l2 = ledger.clone();
    let id1 = account.id.clone();
    let id2 = account.id.clone();
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { l1.use_credits(&id1, 30, "race").await }),
        tokio::spawn(async move { l2.use_credits(&id2, 30, "race").await }),
    );
    let results = [r1.unwrap(), r2.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one concurrent spend must succeed");

    assert_eq!(ledger.get_balance(&account.id).await.unwrap(), 20);
    assert_eq!(replay_sum(&ledger, &account.id).await, 20);
}
