//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use converter_types::{DayWindow, Quote, QuoteRepository, RepoError, Symbol};

use crate::types::{SqliteQuoteRow, encode_timestamp, retention_cutoff};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &SqlitePool, sql: &str, name: &str) -> anyhow::Result<()> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        execute_migration(&pool, include_str!("../migrations/0001_create_quotes.sql"), "0001")
            .await?;

        tracing::debug!("SQLite quote store ready at {}", database_url);
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_one_row(
        &self,
        sql: &str,
        symbol: &Symbol,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Option<Quote>, RepoError> {
        let mut query = sqlx::query_as::<sqlx::Sqlite, SqliteQuoteRow>(sql).bind(symbol.as_str());
        if let Some((start, end)) = bounds {
            query = query.bind(encode_timestamp(start)).bind(encode_timestamp(end));
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(SqliteQuoteRow::into_domain).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl QuoteRepository for SqliteRepo {
    async fn save_quotes(&self, quotes: &[Quote]) -> Result<(), RepoError> {
        if quotes.is_empty() {
            return Ok(());
        }

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        for quote in quotes {
            sqlx::query(r#"INSERT INTO quotes (symbol, price, timestamp) VALUES (?, ?, ?)"#)
                .bind(quote.symbol().as_str())
                .bind(quote.price())
                .bind(encode_timestamp(quote.timestamp()))
                .execute(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        tracing::info!("Saved {} quotes to database", quotes.len());
        Ok(())
    }

    async fn get_latest_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, RepoError> {
        self.fetch_one_row(
            r#"SELECT symbol, price, timestamp FROM quotes
               WHERE symbol = ?
               ORDER BY timestamp DESC, id DESC
               LIMIT 1"#,
            symbol,
            None,
        )
        .await
    }

    async fn get_quote_at(
        &self,
        symbol: &Symbol,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<Quote>, RepoError> {
        let day = DayWindow::containing(at);
        self.fetch_one_row(
            r#"SELECT symbol, price, timestamp FROM quotes
               WHERE symbol = ? AND timestamp >= ? AND timestamp < ?
               ORDER BY timestamp DESC, id DESC
               LIMIT 1"#,
            symbol,
            Some((day.start, day.end)),
        )
        .await
    }

    async fn delete_older_than(&self, retention_days: u32) -> Result<u64, RepoError> {
        let cutoff = retention_cutoff(Utc::now(), retention_days);

        let result = sqlx::query(r#"DELETE FROM quotes WHERE timestamp < ?"#)
            .bind(encode_timestamp(cutoff))
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!("Cleaned up {} old quotes", deleted);
        }
        Ok(deleted)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
