// credits/checkout.rs — Credit purchase checkout + payment webhook handling.
//
// The payment provider owns the actual checkout UI and signature-verified
// webhook delivery; this module only records pending sessions and converts a
// completed-checkout event into a `purchase` ledger transaction.

use crate::{
    error::ApiError,
    storage::{CheckoutSessionRow, Storage},
};
use std::sync::Arc;
use tracing::info;

use super::{CreditLedger, KIND_PURCHASE};

/// Fixed credit packages: (credits, price in USD cents).
pub const PACKAGES: &[(&str, i64, i64)] = &[
    ("small", 50, 499),   // $4.99
    ("medium", 150, 999), // $9.99
    ("large", 500, 2499), // $24.99
];

pub fn package(name: &str) -> Option<(i64, i64)> {
    PACKAGES
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, credits, cents)| (credits, cents))
}

#[derive(Clone)]
pub struct CheckoutService {
    storage: Arc<Storage>,
    ledger: CreditLedger,
}

impl CheckoutService {
    pub fn new(storage: Arc<Storage>, ledger: CreditLedger) -> Self {
        Self { storage, ledger }
    }

    /// Record a pending checkout session for a fixed package and return it.
    /// The returned id is handed to the payment provider as session metadata.
    pub async fn create_session(
        &self,
        account_id: &str,
        package_name: &str,
    ) -> Result<CheckoutSessionRow, ApiError> {
        let (credits, cents) = package(package_name)
            .ok_or_else(|| ApiError::InvalidPackage(package_name.to_string()))?;
        if self.storage.get_account(account_id).await?.is_none() {
            return Err(ApiError::AccountNotFound(account_id.to_string()));
        }
        let session = self
            .storage
            .create_checkout_session(account_id, credits, cents)
            .await?;
        info!(account_id, package_name, credits, "checkout session created");
        Ok(session)
    }

    /// Handle a "checkout completed" webhook event: credit the purchased
    /// amount and mark the session completed when one is referenced.
    pub async fn handle_completed(
        &self,
        account_id: &str,
        credits: i64,
        session_id: Option<&str>,
    ) -> Result<(), ApiError> {
        self.ledger
            .add_credits(
                account_id,
                credits,
                KIND_PURCHASE,
                &format!("Purchased {credits} credits"),
            )
            .await?;
        if let Some(id) = session_id {
            self.storage.complete_checkout_session(id).await?;
        }
        info!(account_id, credits, "checkout completed");
        Ok(())
    }
}
