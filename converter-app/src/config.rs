//! Configuration loading from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use converter_hex::{IngestConfig, ResolverConfig};

/// Application configuration shared by both roles.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub freshness_window: Duration,
    pub binance_rest_url: String,
    pub feed_timeout: Duration,
    pub poll_interval: Duration,
    pub flush_interval: Duration,
    pub cleanup_interval: Duration,
    pub retention_days: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let text = |key: &str, default: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            database_url: text("DATABASE_URL", "sqlite://quotes.db?mode=rwc"),
            api_host: text("API_HOST", "0.0.0.0"),
            api_port: parse(&get, "API_PORT", 8000)?,
            freshness_window: seconds(&get, "QUOTE_FRESHNESS_SECONDS", 60)?,
            binance_rest_url: text("BINANCE_REST_URL", converter_feed::DEFAULT_BASE_URL),
            feed_timeout: seconds(&get, "FEED_TIMEOUT_SECONDS", 10)?,
            poll_interval: seconds(&get, "HTTP_POLLING_INTERVAL", 10)?,
            flush_interval: seconds(&get, "QUOTE_SAVE_INTERVAL", 30)?,
            cleanup_interval: seconds(&get, "QUOTE_CLEANUP_INTERVAL", 3600)?,
            retention_days: parse(&get, "QUOTE_RETENTION_DAYS", 7)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            freshness_window: self.freshness_window,
        }
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            poll_interval: self.poll_interval,
            flush_interval: self.flush_interval,
            cleanup_interval: self.cleanup_interval,
            retention_days: self.retention_days,
        }
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

/// Reads a positive whole number of seconds.
fn seconds(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> anyhow::Result<Duration> {
    let secs: u64 = parse(get, key, default)?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than 0", key);
    }
    Ok(Duration::from_secs(secs))
}
