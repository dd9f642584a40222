//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;

use converter_types::{DayWindow, Quote, QuoteRepository, RepoError, Symbol};

use crate::types::{PgQuoteRow, retention_cutoff};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository storing timestamps as `TIMESTAMPTZ`.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
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

impl PostgresRepo {
    /// Connects to PostgreSQL and runs migrations.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;

        execute_migration(
            &pool,
            include_str!("../migrations/0001_create_quotes_pg.sql"),
            "0001",
        )
        .await?;

        tracing::debug!("PostgreSQL quote store ready");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QuoteRepository for PostgresRepo {
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
            sqlx::query(r#"INSERT INTO quotes (symbol, price, timestamp) VALUES ($1, $2, $3)"#)
                .bind(quote.symbol().as_str())
                .bind(quote.price())
                .bind(quote.timestamp())
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
        let row: Option<PgQuoteRow> = sqlx::query_as(
            r#"SELECT symbol, price, timestamp FROM quotes
               WHERE symbol = $1
               ORDER BY timestamp DESC, id DESC
               LIMIT 1"#,
        )
        .bind(symbol.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(PgQuoteRow::into_domain).transpose()
    }

    async fn get_quote_at(
        &self,
        symbol: &Symbol,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<Quote>, RepoError> {
        let day = DayWindow::containing(at);

        let row: Option<PgQuoteRow> = sqlx::query_as(
            r#"SELECT symbol, price, timestamp FROM quotes
               WHERE symbol = $1 AND timestamp >= $2 AND timestamp < $3
               ORDER BY timestamp DESC, id DESC
               LIMIT 1"#,
        )
        .bind(symbol.as_str())
        .bind(day.start)
        .bind(day.end)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(PgQuoteRow::into_domain).transpose()
    }

    async fn delete_older_than(&self, retention_days: u32) -> Result<u64, RepoError> {
        let cutoff: DateTime<Utc> = retention_cutoff(Utc::now(), retention_days);

        let result = sqlx::query(r#"DELETE FROM quotes WHERE timestamp < $1"#)
            .bind(cutoff)
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
