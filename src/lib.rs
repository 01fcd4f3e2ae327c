pub mod config;
pub mod content;
pub mod credits;
pub mod error;
pub mod keywords;
pub mod metrics;
pub mod referral;
pub mod rest;
pub mod storage;

use std::sync::Arc;

use config::ServerConfig;
use credits::{checkout::CheckoutService, gifting::GiftService, CreditLedger};
use keywords::KeywordAnalyzer;
use metrics::{ApiMetrics, SharedMetrics};
use referral::ReferralService;
use storage::Storage;

/// Shared application state passed to every route handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    /// Per-account credit balance + append-only transaction history.
    pub ledger: CreditLedger,
    /// Checkout sessions and payment-webhook completion.
    pub checkout: CheckoutService,
    /// Admin gifting + promotional lucky bonus.
    pub gifts: GiftService,
    /// Referral codes, attribution, and reward grants.
    pub referrals: ReferralService,
    /// Keyword research over external trend/suggestion sources.
    pub analyzer: KeywordAnalyzer,
    /// In-process Prometheus-style counters; also the uptime source.
    pub metrics: SharedMetrics,
}

impl AppContext {
    pub fn new(config: Arc<ServerConfig>, storage: Arc<Storage>) -> Arc<Self> {
        let ledger = CreditLedger::new(storage.clone());
        let checkout = CheckoutService::new(storage.clone(), ledger.clone());
        let gifts = GiftService::new(storage.clone(), ledger.clone());
        let referrals = ReferralService::new(
            storage.clone(),
            ledger.clone(),
            config.client_url.clone(),
        );
        let analyzer = KeywordAnalyzer::new(
            config.trends_url.clone(),
            config.suggest_url.clone(),
            config.related_url.clone(),
        );

        Arc::new(Self {
            config,
            storage,
            ledger,
            checkout,
            gifts,
            referrals,
            analyzer,
            metrics: Arc::new(ApiMetrics::new()),
        })
    }
}
