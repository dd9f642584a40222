//! Price feed port.
//!
//! This trait defines the interface for upstream market data sources.
//! Implementations can be HTTP pollers, mock feeds, etc.

use crate::domain::TickerEntry;

/// Error type for price feed operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("Feed returned HTTP {0}")]
    Status(u16),

    #[error("Invalid feed payload: {0}")]
    InvalidPayload(String),
}

/// Port trait for external price feeds.
#[async_trait::async_trait]
pub trait PriceFeed: Send + Sync + 'static {
    /// Fetches the current price of every listed symbol in one request.
    ///
    /// Entries that decode are returned unvalidated; the caller decides what
    /// to drop.
    async fn fetch_tickers(&self) -> Result<Vec<TickerEntry>, FeedError>;
}
