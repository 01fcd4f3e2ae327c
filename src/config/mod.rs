// config/mod.rs — Server configuration.
//
// Priority (highest to lowest):
//   1. CLI / env — passed as `Some(value)` from clap
//   2. TOML file at `{data_dir}/config.toml`
//   3. Built-in defaults

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 4310;
const DEFAULT_CLIENT_URL: &str = "https://seomnissiah.com";
const DEFAULT_TRENDS_URL: &str = "https://trends.seomnissiah.com/api/interest";
const DEFAULT_SUGGEST_URL: &str = "https://suggestqueries.google.com/complete/search";
const DEFAULT_RELATED_URL: &str = "https://api.duckduckgo.com/";

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".seomnid")
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log: String,
    /// Web client origin — used for referral signup links.
    pub client_url: String,
    /// External keyword-data endpoints. Overridable for self-hosted proxies
    /// and for tests.
    pub trends_url: String,
    pub suggest_url: String,
    pub related_url: String,
    /// Bearer token required for the admin routes.
    /// None = admin endpoints disabled for remote callers is NOT implied;
    /// None simply skips the extra admin check (trusted local deployments).
    pub admin_token: Option<String>,
}

/// TOML overlay — every field optional, absent fields fall through to
/// defaults.
#[derive(Debug, Default, Deserialize)]
struct ConfigToml {
    port: Option<u16>,
    bind_address: Option<String>,
    log: Option<String>,
    client_url: Option<String>,
    trends_url: Option<String>,
    suggest_url: Option<String>,
    related_url: Option<String>,
    admin_token: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<ConfigToml> {
    let path = data_dir.join("config.toml");
    let raw = std::fs::read_to_string(&path).ok()?;
    match toml::from_str(&raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("ignoring malformed {}: {e}", path.display());
            None
        }
    }
}

impl ServerConfig {
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());
        let bind_address = bind_address
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let client_url = std::env::var("SEOMNID_CLIENT_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.client_url)
            .unwrap_or_else(|| DEFAULT_CLIENT_URL.to_string());

        let trends_url = std::env::var("SEOMNID_TRENDS_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.trends_url)
            .unwrap_or_else(|| DEFAULT_TRENDS_URL.to_string());

        let suggest_url = std::env::var("SEOMNID_SUGGEST_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.suggest_url)
            .unwrap_or_else(|| DEFAULT_SUGGEST_URL.to_string());

        let related_url = std::env::var("SEOMNID_RELATED_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.related_url)
            .unwrap_or_else(|| DEFAULT_RELATED_URL.to_string());

        let admin_token = std::env::var("SEOMNID_ADMIN_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .or(toml.admin_token);

        Self {
            port,
            bind_address,
            data_dir,
            log,
            client_url,
            trends_url,
            suggest_url,
            related_url,
            admin_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.log, "info");
    }

    #[test]
    fn cli_values_override_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = 9000\nlog = \"debug\"\n").unwrap();
        let config = ServerConfig::new(
            Some(5000),
            Some(dir.path().to_path_buf()),
            None,
            None,
        );
        assert_eq!(config.port, 5000); // CLI wins
        assert_eq!(config.log, "debug"); // TOML fills the gap
    }
}
