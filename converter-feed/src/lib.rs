//! # Converter Feed
//!
//! Outbound adapter polling the Binance REST API for current ticker prices.

use std::time::Duration;

use async_trait::async_trait;
use converter_types::{FeedError, PriceFeed, TickerEntry};
use reqwest::Client;
use serde::Deserialize;

/// Default public Binance REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Price feed backed by `GET /api/v3/ticker/price`.
pub struct BinanceFeed {
    base_url: String,
    http: Client,
}

impl BinanceFeed {
    /// Creates a feed client with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        Ok(Self::with_client(base_url, http))
    }

    /// Creates a feed around an existing HTTP client.
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn tickers_url(&self) -> String {
        format!("{}/api/v3/ticker/price", self.base_url)
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    async fn fetch_tickers(&self) -> Result<Vec<TickerEntry>, FeedError> {
        let resp = self
            .http
            .get(self.tickers_url())
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let values: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| FeedError::InvalidPayload(e.to_string()))?;

        let entries: Vec<TickerEntry> = values
            .into_iter()
            .filter_map(|value| match TickerEntry::deserialize(&value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(raw = %value, "Skipping undecodable ticker: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Fetched {} tickers from {}", entries.len(), self.base_url);
        Ok(entries)
    }
}
