//! Simple in-process counters exposed as `GET /metrics` in Prometheus text
//! format. No external library needed — all counters are `AtomicU64`
//! incremented inline by the route handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// In-process API counters shared across all requests.
#[derive(Debug)]
pub struct ApiMetrics {
    /// Total credits added through completed checkouts.
    pub credits_purchased: AtomicU64,
    /// Total credits spent via /credits/use.
    pub credits_spent: AtomicU64,
    /// Total credits issued through admin gift campaigns.
    pub credits_gifted: AtomicU64,
    /// Total referrals processed successfully.
    pub referrals_processed: AtomicU64,
    /// Total keyword analyses served.
    pub keyword_analyses: AtomicU64,
    /// Total content documents generated.
    pub content_generated: AtomicU64,
    /// Server start time — used to calculate uptime.
    pub started_at: Instant,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self {
            credits_purchased: AtomicU64::new(0),
            credits_spent: AtomicU64::new(0),
            credits_gifted: AtomicU64::new(0),
            referrals_processed: AtomicU64::new(0),
            keyword_analyses: AtomicU64::new(0),
            content_generated: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn add_credits_purchased(&self, n: u64) {
        self.credits_purchased.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_credits_spent(&self, n: u64) {
        self.credits_spent.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_credits_gifted(&self, n: u64) {
        self.credits_gifted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_referrals_processed(&self) {
        self.referrals_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_keyword_analyses(&self) {
        self.keyword_analyses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_content_generated(&self) {
        self.content_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Render counters in Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        let uptime = self.started_at.elapsed().as_secs();
        let credits_purchased = self.credits_purchased.load(Ordering::Relaxed);
        let credits_spent = self.credits_spent.load(Ordering::Relaxed);
        let credits_gifted = self.credits_gifted.load(Ordering::Relaxed);
        let referrals_processed = self.referrals_processed.load(Ordering::Relaxed);
        let keyword_analyses = self.keyword_analyses.load(Ordering::Relaxed);
        let content_generated = self.content_generated.load(Ordering::Relaxed);

        format!(
            "# HELP seomnid_uptime_seconds Server uptime in seconds.\n\
             # TYPE seomnid_uptime_seconds gauge\n\
             seomnid_uptime_seconds {uptime}\n\
             # HELP seomnid_credits_purchased_total Credits added through completed checkouts.\n\
             # TYPE seomnid_credits_purchased_total counter\n\
             seomnid_credits_purchased_total {credits_purchased}\n\
             # HELP seomnid_credits_spent_total Credits spent by accounts.\n\
             # TYPE seomnid_credits_spent_total counter\n\
             seomnid_credits_spent_total {credits_spent}\n\
             # HELP seomnid_credits_gifted_total Credits issued through gift campaigns.\n\
             # TYPE seomnid_credits_gifted_total counter\n\
             seomnid_credits_gifted_total {credits_gifted}\n\
             # HELP seomnid_referrals_processed_total Referrals processed successfully.\n\
             # TYPE seomnid_referrals_processed_total counter\n\
             seomnid_referrals_processed_total {referrals_processed}\n\
             # HELP seomnid_keyword_analyses_total Keyword analyses served.\n\
             # TYPE seomnid_keyword_analyses_total counter\n\
             seomnid_keyword_analyses_total {keyword_analyses}\n\
             # HELP seomnid_content_generated_total Content documents generated.\n\
             # TYPE seomnid_content_generated_total counter\n\
             seomnid_content_generated_total {content_generated}\n"
        )
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle — cheaply clonable.
pub type SharedMetrics = Arc<ApiMetrics>;
