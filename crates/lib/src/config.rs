//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.gasbot/config.json`) and environment.
//! Environment variables override file values for every secret and connection
//! setting so the service can run from env alone (no config file required).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// LINE platform credentials.
    #[serde(default)]
    pub line: LineConfig,

    /// Relational store connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Knowledge-search collaborator settings.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
}

/// Server bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the HTTP gateway (default 9997).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0" — the webhook must be reachable from the platform).
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    9997
}

fn default_server_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// LINE channel credentials. Both are overridden by env when set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineConfig {
    /// Channel secret used to verify webhook signatures. Overridden by LINE_CHANNEL_SECRET.
    pub channel_secret: Option<String>,

    /// Access token for the reply API. Overridden by LINE_CHANNEL_ACCESS_TOKEN.
    /// When absent, replies are logged instead of delivered.
    pub channel_access_token: Option<String>,
}

/// Postgres connection settings: a full URL, or discrete host/port/name/user/password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Full connection URL. Overridden by DATABASE_URL.
    pub url: Option<String>,

    /// Discrete parts, each overridden by DB_HOST / DB_PORT / DB_NAME / DB_USER / DB_PASSWORD.
    pub host: Option<String>,
    pub port: Option<String>,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Knowledge-search collaborator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeConfig {
    /// Base URL of the search service. Overridden by KNOWLEDGE_API_URL.
    pub api_url: Option<String>,
}

fn non_blank(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn env_or(var: &str, fallback: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(non_blank)
        .or_else(|| fallback.cloned().and_then(non_blank))
}

/// Resolve the channel secret: env LINE_CHANNEL_SECRET overrides config.
pub fn resolve_channel_secret(config: &Config) -> Option<String> {
    env_or("LINE_CHANNEL_SECRET", config.line.channel_secret.as_ref())
}

/// Resolve the reply-API access token: env LINE_CHANNEL_ACCESS_TOKEN overrides config.
pub fn resolve_channel_access_token(config: &Config) -> Option<String> {
    env_or(
        "LINE_CHANNEL_ACCESS_TOKEN",
        config.line.channel_access_token.as_ref(),
    )
}

/// Resolve the knowledge-search base URL: env KNOWLEDGE_API_URL overrides config.
pub fn resolve_knowledge_url(config: &Config) -> Option<String> {
    env_or("KNOWLEDGE_API_URL", config.knowledge.api_url.as_ref())
}

/// Resolve the gateway port: env PORT overrides config.
pub fn resolve_port(config: &Config) -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(config.server.port)
}

/// Resolve the Postgres DSN: DATABASE_URL (env, then config url), else a URL
/// assembled from the discrete parts. Returns None when neither a URL nor a
/// host+name pair is configured — the service then runs without a store.
pub fn resolve_database_dsn(config: &Config) -> Option<String> {
    if let Some(url) = env_or("DATABASE_URL", config.database.url.as_ref()) {
        return Some(url);
    }
    let host = env_or("DB_HOST", config.database.host.as_ref())?;
    let name = env_or("DB_NAME", config.database.name.as_ref())?;
    let port = env_or("DB_PORT", config.database.port.as_ref()).unwrap_or_else(|| "5432".to_string());
    let user = env_or("DB_USER", config.database.user.as_ref()).unwrap_or_else(|| "postgres".to_string());
    let password = env_or("DB_PASSWORD", config.database.password.as_ref()).unwrap_or_default();
    Some(format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, name
    ))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("GASBOT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".gasbot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or GASBOT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 9997);
        assert_eq!(s.bind, "0.0.0.0");
    }

    #[test]
    fn dsn_from_discrete_parts() {
        let mut config = Config::default();
        config.database.host = Some("db.internal".to_string());
        config.database.name = Some("gas".to_string());
        config.database.user = Some("bot".to_string());
        config.database.password = Some("pw".to_string());
        assert_eq!(
            resolve_database_dsn(&config).as_deref(),
            Some("postgres://bot:pw@db.internal:5432/gas")
        );
    }

    #[test]
    fn dsn_url_wins_over_parts() {
        let mut config = Config::default();
        config.database.url = Some("postgres://a:b@h/x".to_string());
        config.database.host = Some("ignored".to_string());
        config.database.name = Some("ignored".to_string());
        assert_eq!(
            resolve_database_dsn(&config).as_deref(),
            Some("postgres://a:b@h/x")
        );
    }

    #[test]
    fn dsn_none_without_host_or_url() {
        let config = Config::default();
        assert_eq!(resolve_database_dsn(&config), None);
    }

    #[test]
    fn blank_config_values_are_filtered() {
        let mut config = Config::default();
        config.line.channel_secret = Some("   ".to_string());
        assert_eq!(resolve_channel_secret(&config), None);
    }

    #[test]
    fn parses_partial_config_file() {
        let config: Config = serde_json::from_str(r#"{"server": {"port": 9901}}"#).unwrap();
        assert_eq!(config.server.port, 9901);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert!(config.line.channel_secret.is_none());
    }
}
