// storage/mod.rs — SQLite persistence for accounts, ledgers, and referrals.
//
// Every balance-affecting write commits the ledger row update and the
// transaction-row insert as a single sqlx transaction; a balance that drifts
// from the sum of its transactions is a bug, not an operational state.

use crate::error::ApiError;
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// Default timeout for aggregate queries that scan the full transaction log.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Internal(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        ))),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: String,
    pub email: String,
    /// Lifecycle bucket used by gift campaigns: new | inactive | loyal.
    pub status: String,
    pub created_at: String,
    /// Preferred generated-content length in words.
    pub content_length: i64,
    pub target_keyword_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    pub account_id: String,
    pub balance: i64,
    /// Lifetime transaction count. Kept on the row so the lucky-bonus "new
    /// account" check never has to scan the transaction history.
    pub txn_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub account_id: String,
    /// purchase | use | refund | bonus | gift
    pub kind: String,
    /// Signed: positive for purchase/refund/bonus/gift, negative for use.
    pub amount: i64,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReferralRow {
    pub account_id: String,
    pub code: String,
    pub total_referrals: i64,
    pub total_credits_earned: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferredUserRow {
    pub referrer_id: String,
    pub referred_id: String,
    pub signup_date: String,
    pub credit_awarded: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckoutSessionRow {
    pub id: String,
    pub account_id: String,
    pub credits: i64,
    pub amount_cents: i64,
    /// pending | completed
    pub status: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self, ApiError> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| ApiError::Internal(e.into()))?;
        let db_path = data_dir.join("seomnid.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))
                .map_err(ApiError::Database)?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), ApiError> {
        // Idempotent schema — safe to run on every startup.
        let stmts = [
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'new',
                created_at TEXT NOT NULL,
                content_length INTEGER NOT NULL DEFAULT 1500,
                target_keyword_count INTEGER NOT NULL DEFAULT 5
            )",
            "CREATE TABLE IF NOT EXISTS ledgers (
                account_id TEXT PRIMARY KEY,
                balance INTEGER NOT NULL DEFAULT 0,
                txn_count INTEGER NOT NULL DEFAULT 0
            )",
            "CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount INTEGER NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_transactions_account
                ON transactions(account_id)",
            "CREATE INDEX IF NOT EXISTS idx_transactions_kind
                ON transactions(kind)",
            "CREATE TABLE IF NOT EXISTS referrals (
                account_id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                total_referrals INTEGER NOT NULL DEFAULT 0,
                total_credits_earned INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS referred_users (
                referrer_id TEXT NOT NULL,
                referred_id TEXT NOT NULL,
                signup_date TEXT NOT NULL,
                credit_awarded INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (referrer_id, referred_id)
            )",
            "CREATE TABLE IF NOT EXISTS checkout_sessions (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                credits INTEGER NOT NULL,
                amount_cents INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            )",
        ];
        for stmt in stmts {
            sqlx::query(stmt).execute(pool).await?;
        }
        Ok(())
    }

    // ─── Accounts ───────────────────────────────────────────────────────────

    pub async fn create_account(&self, email: &str, status: &str) -> Result<AccountRow, ApiError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO accounts (id, email, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(status)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_account(&id)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("account not found after insert")))
    }

    pub async fn get_account(&self, id: &str) -> Result<Option<AccountRow>, ApiError> {
        Ok(sqlx::query_as("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_account_ids_by_status(&self, status: &str) -> Result<Vec<String>, ApiError> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM accounts WHERE status = ? ORDER BY rowid")
                .bind(status)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    // ─── Ledgers ────────────────────────────────────────────────────────────

    pub async fn get_ledger(&self, account_id: &str) -> Result<Option<LedgerRow>, ApiError> {
        Ok(sqlx::query_as("SELECT * FROM ledgers WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Append a positive transaction and increment the balance as one unit.
    ///
    /// Creates the ledger row on first use for a known account; fails with
    /// `AccountNotFound` when the account itself does not exist.
    pub async fn append_credit(
        &self,
        account_id: &str,
        kind: &str,
        amount: i64,
        description: &str,
    ) -> Result<LedgerRow, ApiError> {
        debug_assert!(amount > 0);
        if self.get_account(account_id).await?.is_none() {
            return Err(ApiError::AccountNotFound(account_id.to_string()));
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO ledgers (account_id, balance, txn_count) VALUES (?, 0, 0) ON CONFLICT(account_id) DO NOTHING")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE ledgers SET balance = balance + ?, txn_count = txn_count + 1 WHERE account_id = ?",
        )
        .bind(amount)
        .bind(account_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "INSERT INTO transactions (id, account_id, kind, amount, description, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(account_id)
        .bind(kind)
        .bind(amount)
        .bind(description)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
        let ledger: LedgerRow = sqlx::query_as("SELECT * FROM ledgers WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(ledger)
    }

    /// Spend credits with a compare-and-swap guard.
    ///
    /// The conditional `balance >= amount` update and the negated transaction
    /// insert commit together; two concurrent spends cannot both pass the
    /// guard because SQLite serializes writers.
    pub async fn spend_credits(
        &self,
        account_id: &str,
        amount: i64,
        description: &str,
    ) -> Result<LedgerRow, ApiError> {
        debug_assert!(amount > 0);
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE ledgers SET balance = balance - ?1, txn_count = txn_count + 1
             WHERE account_id = ?2 AND balance >= ?1",
        )
        .bind(amount)
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Rejected: distinguish "no ledger" from "not enough balance".
            // The open transaction is dropped without committing.
            let existing: Option<LedgerRow> =
                sqlx::query_as("SELECT * FROM ledgers WHERE account_id = ?")
                    .bind(account_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return match existing {
                Some(ledger) => Err(ApiError::InsufficientCredits {
                    balance: ledger.balance,
                    requested: amount,
                }),
                None => Err(ApiError::LedgerNotFound(account_id.to_string())),
            };
        }

        sqlx::query(
            "INSERT INTO transactions (id, account_id, kind, amount, description, created_at)
             VALUES (?, ?, 'use', ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(account_id)
        .bind(-amount)
        .bind(description)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
        let ledger: LedgerRow = sqlx::query_as("SELECT * FROM ledgers WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(ledger)
    }

    /// Transactions in insertion order (insertion order is chronological).
    pub async fn list_transactions(
        &self,
        account_id: &str,
    ) -> Result<Vec<TransactionRow>, ApiError> {
        Ok(
            sqlx::query_as("SELECT * FROM transactions WHERE account_id = ? ORDER BY rowid")
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Aggregate over all gift transactions: (total, count, average).
    pub async fn gift_stats(&self) -> Result<(i64, i64, f64), ApiError> {
        with_timeout(async {
            let row: (Option<i64>, i64, Option<f64>) = sqlx::query_as(
                "SELECT SUM(amount), COUNT(*), AVG(amount) FROM transactions WHERE kind = 'gift'",
            )
            .fetch_one(&self.pool)
            .await?;
            Ok((row.0.unwrap_or(0), row.1, row.2.unwrap_or(0.0)))
        })
        .await
    }

    // ─── Referrals ──────────────────────────────────────────────────────────

    pub async fn insert_referral(
        &self,
        account_id: &str,
        code: &str,
    ) -> Result<ReferralRow, ApiError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO referrals (account_id, code, total_referrals, total_credits_earned, created_at)
             VALUES (?, ?, 0, 0, ?)",
        )
        .bind(account_id)
        .bind(code)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_referral(account_id)
            .await?
            .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("referral not found after insert")))
    }

    pub async fn get_referral(&self, account_id: &str) -> Result<Option<ReferralRow>, ApiError> {
        Ok(sqlx::query_as("SELECT * FROM referrals WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_referral_by_code(&self, code: &str) -> Result<Option<ReferralRow>, ApiError> {
        Ok(sqlx::query_as("SELECT * FROM referrals WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn referral_code_exists(&self, code: &str) -> Result<bool, ApiError> {
        Ok(self.get_referral_by_code(code).await?.is_some())
    }

    pub async fn is_already_referred(
        &self,
        referrer_id: &str,
        referred_id: &str,
    ) -> Result<bool, ApiError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM referred_users WHERE referrer_id = ? AND referred_id = ?",
        )
        .bind(referrer_id)
        .bind(referred_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn list_referred_users(
        &self,
        referrer_id: &str,
    ) -> Result<Vec<ReferredUserRow>, ApiError> {
        Ok(
            sqlx::query_as("SELECT * FROM referred_users WHERE referrer_id = ? ORDER BY rowid")
                .bind(referrer_id)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Append a referred user and bump the running totals as one unit.
    /// Returns the updated referral record.
    pub async fn record_referred_user(
        &self,
        referrer_id: &str,
        referred_id: &str,
        credits_earned: i64,
    ) -> Result<ReferralRow, ApiError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO referred_users (referrer_id, referred_id, signup_date, credit_awarded)
             VALUES (?, ?, ?, 0)",
        )
        .bind(referrer_id)
        .bind(referred_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE referrals SET total_referrals = total_referrals + 1,
                 total_credits_earned = total_credits_earned + ?
             WHERE account_id = ?",
        )
        .bind(credits_earned)
        .bind(referrer_id)
        .execute(&mut *tx)
        .await?;
        let referral: ReferralRow = sqlx::query_as("SELECT * FROM referrals WHERE account_id = ?")
            .bind(referrer_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(referral)
    }

    /// Credit additional referral earnings (milestone bonus) to the totals.
    pub async fn add_referral_earnings(
        &self,
        referrer_id: &str,
        amount: i64,
    ) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE referrals SET total_credits_earned = total_credits_earned + ?
             WHERE account_id = ?",
        )
        .bind(amount)
        .bind(referrer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ─── Checkout sessions ──────────────────────────────────────────────────

    pub async fn create_checkout_session(
        &self,
        account_id: &str,
        credits: i64,
        amount_cents: i64,
    ) -> Result<CheckoutSessionRow, ApiError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO checkout_sessions (id, account_id, credits, amount_cents, status, created_at)
             VALUES (?, ?, ?, ?, 'pending', ?)",
        )
        .bind(&id)
        .bind(account_id)
        .bind(credits)
        .bind(amount_cents)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        let row = sqlx::query_as("SELECT * FROM checkout_sessions WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_checkout_session(
        &self,
        id: &str,
    ) -> Result<Option<CheckoutSessionRow>, ApiError> {
        Ok(sqlx::query_as("SELECT * FROM checkout_sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn complete_checkout_session(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE checkout_sessions SET status = 'completed' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
