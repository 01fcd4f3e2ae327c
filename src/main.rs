use anyhow::Result;
use clap::Parser;
use seomnid::{config::ServerConfig, rest, storage::Storage, AppContext};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "seomnid",
    about = "SEOmnissiah API server — credit ledger, gifting, referrals, keyword research",
    version
)]
struct Args {
    /// HTTP server port
    #[arg(long, env = "SEOMNID_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "SEOMNID_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SEOMNID_LOG")]
    log: Option<String>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 behind a reverse proxy)
    #[arg(long, env = "SEOMNID_BIND")]
    bind_address: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Arc::new(ServerConfig::new(
        args.port,
        args.data_dir,
        args.log,
        args.bind_address,
    ));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log.clone())),
        )
        .compact()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "starting seomnid"
    );

    let storage = Arc::new(Storage::new(&config.data_dir).await?);
    let ctx = AppContext::new(config, storage);

    rest::start_rest_server(ctx).await?;
    info!("server shut down");
    Ok(())
}
