// rest/mod.rs — Public REST API server.
//
// Axum HTTP server; stateless JSON handlers over the credit/referral/keyword
// services.
//
// Endpoints:
//   POST /api/v1/credits/checkout
//   POST /api/v1/credits/webhook     (no bearer — payment provider callback)
//   GET  /api/v1/credits/balance
//   POST /api/v1/credits/use
//   POST /api/v1/admin/gift-credits
//   GET  /api/v1/admin/gift-stats
//   GET  /api/v1/referral/stats
//   POST /api/v1/referral/process
//   POST /api/v1/keywords/analyze
//   POST /api/v1/content/generate
//   GET  /api/v1/health              (no auth)
//   GET  /metrics                    (no auth)

pub mod auth;
pub mod routes;

use crate::AppContext;
use anyhow::Result;
use axum::{
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        // Health + metrics (no auth)
        .route("/api/v1/health", get(routes::health::health))
        .route("/metrics", get(routes::metrics::get_metrics))
        // Credits
        .route("/api/v1/credits/checkout", post(routes::credits::checkout))
        .route("/api/v1/credits/webhook", post(routes::credits::webhook))
        .route("/api/v1/credits/balance", get(routes::credits::balance))
        .route("/api/v1/credits/use", post(routes::credits::use_credits))
        // Admin gifting
        .route(
            "/api/v1/admin/gift-credits",
            post(routes::admin::gift_credits),
        )
        .route("/api/v1/admin/gift-stats", get(routes::admin::gift_stats))
        // Referral program
        .route("/api/v1/referral/stats", get(routes::referral::stats))
        .route("/api/v1/referral/process", post(routes::referral::process))
        // Keyword research + content generation
        .route("/api/v1/keywords/analyze", post(routes::keywords::analyze))
        .route("/api/v1/content/generate", post(routes::content::generate))
        .layer(cors)
        .with_state(ctx)
}

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
