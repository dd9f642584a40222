//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (SQLite, Postgres, in-memory mocks) implement this trait.

use chrono::{DateTime, FixedOffset};

use crate::domain::{Quote, Symbol};
use crate::error::RepoError;

/// Storage for timestamped quotes.
///
/// Rows are append-only: quotes are inserted in batches and removed only by
/// the retention sweep. Duplicate `(symbol, timestamp)` rows are allowed.
#[async_trait::async_trait]
pub trait QuoteRepository: Send + Sync + 'static {
    /// Appends every quote and commits before returning. Empty input is a no-op.
    async fn save_quotes(&self, quotes: &[Quote]) -> Result<(), RepoError>;

    /// Gets the quote with the latest timestamp for a symbol.
    async fn get_latest_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, RepoError>;

    /// Gets the latest quote for a symbol on the calendar day containing `at`.
    ///
    /// The day boundary is computed in `at`'s own UTC offset.
    async fn get_quote_at(
        &self,
        symbol: &Symbol,
        at: DateTime<FixedOffset>,
    ) -> Result<Option<Quote>, RepoError>;

    /// Deletes quotes older than `retention_days` and returns how many went.
    async fn delete_older_than(&self, retention_days: u32) -> Result<u64, RepoError>;

    /// Releases the underlying connections.
    async fn close(&self);
}
