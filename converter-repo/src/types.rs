//! Database row types and timestamp encoding shared by the adapters.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use sqlx::FromRow;

use converter_types::{Quote, RepoError, Symbol};

/// Quote row as stored by SQLite.
///
/// Timestamps are fixed-width UTC text, so lexical order is chronological order.
#[cfg(feature = "sqlite")]
#[derive(FromRow)]
pub struct SqliteQuoteRow {
    pub symbol: String,
    pub price: f64,
    pub timestamp: String,
}

#[cfg(feature = "sqlite")]
impl SqliteQuoteRow {
    pub fn into_domain(self) -> Result<Quote, RepoError> {
        let timestamp = decode_timestamp(&self.timestamp)?;
        build_quote(&self.symbol, self.price, timestamp)
    }
}

/// Quote row as stored by PostgreSQL (`TIMESTAMPTZ`).
#[cfg(feature = "postgres")]
#[derive(FromRow)]
pub struct PgQuoteRow {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(feature = "postgres")]
impl PgQuoteRow {
    pub fn into_domain(self) -> Result<Quote, RepoError> {
        build_quote(&self.symbol, self.price, self.timestamp)
    }
}

fn build_quote(symbol: &str, price: f64, timestamp: DateTime<Utc>) -> Result<Quote, RepoError> {
    let symbol = Symbol::parse(symbol)?;
    Ok(Quote::new(symbol, price, timestamp)?)
}

/// Encodes a timestamp as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
#[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RepoError::Database(format!("Corrupt timestamp '{}': {}", raw, e)))
}

/// Oldest timestamp kept by a retention sweep run at `now`.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    now - TimeDelta::days(i64::from(retention_days))
}
