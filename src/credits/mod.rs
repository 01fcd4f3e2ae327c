// credits/mod.rs — Credit ledger service.
//
// One ledger per account: a non-negative balance plus an append-only
// transaction history. Corrections happen via offsetting transactions;
// nothing is ever edited or deleted.

pub mod checkout;
pub mod gifting;

use crate::{
    error::ApiError,
    storage::{LedgerRow, Storage, TransactionRow},
};
use std::sync::Arc;
use tracing::info;

/// Transaction kinds. Positive by convention for everything except `use`.
pub const KIND_PURCHASE: &str = "purchase";
pub const KIND_USE: &str = "use";
pub const KIND_REFUND: &str = "refund";
pub const KIND_BONUS: &str = "bonus";
pub const KIND_GIFT: &str = "gift";

#[derive(Clone)]
pub struct CreditLedger {
    storage: Arc<Storage>,
}

impl CreditLedger {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Append a positive transaction of the given kind and increment the
    /// balance. The ledger row is created lazily on first credit for any
    /// known account.
    pub async fn add_credits(
        &self,
        account_id: &str,
        amount: i64,
        kind: &str,
        description: &str,
    ) -> Result<LedgerRow, ApiError> {
        if amount <= 0 {
            return Err(ApiError::InvalidAmount(amount));
        }
        let ledger = self
            .storage
            .append_credit(account_id, kind, amount, description)
            .await?;
        info!(account_id, amount, kind, "credits added");
        Ok(ledger)
    }

    /// Spend credits. Rejected atomically with `InsufficientCredits` when the
    /// balance is too low — no transaction is appended and the balance is
    /// unchanged.
    pub async fn use_credits(
        &self,
        account_id: &str,
        amount: i64,
        description: &str,
    ) -> Result<LedgerRow, ApiError> {
        if amount <= 0 {
            return Err(ApiError::InvalidAmount(amount));
        }
        let ledger = self
            .storage
            .spend_credits(account_id, amount, description)
            .await?;
        info!(account_id, amount, balance = ledger.balance, "credits used");
        Ok(ledger)
    }

    /// Current balance; 0 when no ledger exists yet. Absence means "never
    /// purchased or spent", not an error.
    pub async fn get_balance(&self, account_id: &str) -> Result<i64, ApiError> {
        Ok(self
            .storage
            .get_ledger(account_id)
            .await?
            .map(|l| l.balance)
            .unwrap_or(0))
    }

    pub async fn get_ledger(&self, account_id: &str) -> Result<Option<LedgerRow>, ApiError> {
        self.storage.get_ledger(account_id).await
    }

    pub async fn transactions(&self, account_id: &str) -> Result<Vec<TransactionRow>, ApiError> {
        self.storage.list_transactions(account_id).await
    }
}
