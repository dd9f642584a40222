//! Raw price-feed entries.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{Quote, Symbol};
use crate::error::DomainError;

/// One `{symbol, price}` entry as delivered by a price feed.
///
/// Every field is optional so that a single malformed entry can be rejected on
/// its own instead of failing deserialization of the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TickerEntry {
    #[serde(default)]
    pub symbol: Option<String>,
    /// Feeds send prices either as JSON numbers or as decimal strings.
    #[serde(default)]
    pub price: Option<Value>,
}

impl TickerEntry {
    pub fn new(symbol: impl Into<String>, price: impl Into<Value>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            price: Some(price.into()),
        }
    }

    /// Builds a quote observed at `observed_at` from this entry.
    pub fn to_quote(&self, observed_at: DateTime<Utc>) -> Result<Quote, DomainError> {
        let symbol = self
            .symbol
            .as_deref()
            .ok_or_else(|| DomainError::ValidationError("Ticker has no symbol".into()))?;
        let symbol = Symbol::parse(symbol)?;

        let price = match &self.price {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            DomainError::ValidationError(format!("Ticker {} has no valid price", symbol))
        })?;

        Quote::new(symbol, price, observed_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_price() {
        let now = Utc::now();
        let quote = TickerEntry::new("btcusdt", "45000.50")
            .to_quote(now)
            .unwrap();
        assert_eq!(quote.symbol().as_str(), "BTCUSDT");
        assert_eq!(quote.price(), 45000.5);
        assert_eq!(quote.timestamp(), now);
    }

    #[test]
    fn test_numeric_price() {
        let quote = TickerEntry::new("ETHUSDT", 3000.0)
            .to_quote(Utc::now())
            .unwrap();
        assert_eq!(quote.price(), 3000.0);
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        let now = Utc::now();
        let entries = [
            TickerEntry {
                symbol: None,
                price: Some("1.0".into()),
            },
            TickerEntry {
                symbol: Some("BTCUSDT".into()),
                price: None,
            },
            TickerEntry::new("BTCUSDT", "not-a-number"),
            TickerEntry::new("BTCUSDT", "0"),
            TickerEntry::new("BTCUSDT", -5.0),
            TickerEntry::new("", "1.0"),
            TickerEntry {
                symbol: Some("BTCUSDT".into()),
                price: Some(Value::Bool(true)),
            },
        ];
        for entry in entries {
            assert!(entry.to_quote(now).is_err(), "{entry:?}");
        }
    }

    #[test]
    fn test_deserialize_binance_shape() {
        let entries: Vec<TickerEntry> = serde_json::from_str(
            r#"[{"symbol":"BTCUSDT","price":"45000.00"},{"symbol":"ETHUSDT"}]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].price, None);
    }
}
