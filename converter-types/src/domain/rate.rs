//! Outcome of a rate lookup.

use std::time::Duration;

use crate::domain::Quote;
use crate::error::DomainError;

/// A resolved cross rate between two quotes sharing a base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRate {
    /// Units of `to` per unit of `from`.
    pub rate: f64,
    pub from_quote: Quote,
    pub to_quote: Quote,
}

impl ConversionRate {
    /// Computes `from.price / to.price`.
    pub fn between(from_quote: Quote, to_quote: Quote) -> Result<Self, DomainError> {
        // Unreachable for stored quotes, which are always positive.
        if to_quote.price() <= 0.0 {
            return Err(DomainError::DivisionByZero(to_quote.symbol().clone()));
        }
        Ok(Self {
            rate: from_quote.price() / to_quote.price(),
            from_quote,
            to_quote,
        })
    }

    pub fn convert(&self, amount: f64) -> f64 {
        amount * self.rate
    }
}

/// Quotes exist but are too old for a live conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutdatedQuotes {
    pub max_age: Duration,
}

impl OutdatedQuotes {
    pub const CODE: &'static str = "quotes_outdated";

    pub fn message(&self) -> String {
        format!("Quotes are older than {} seconds", self.max_age.as_secs())
    }
}

/// Result of resolving a conversion rate.
///
/// Hard failures (unsupported pair, storage errors) travel in the `Err` arm of
/// the surrounding `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum RateResult {
    Rate(ConversionRate),
    NotFound,
    Outdated(OutdatedQuotes),
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::Symbol;

    fn quote(symbol: &str, price: f64) -> Quote {
        Quote::new(Symbol::parse(symbol).unwrap(), price, Utc::now()).unwrap()
    }

    #[test]
    fn test_rate_is_price_ratio() {
        let rate = ConversionRate::between(quote("BTCUSDT", 45000.0), quote("ETHUSDT", 3000.0))
            .unwrap();
        assert!((rate.rate - 15.0).abs() < 1e-9);
        assert!((rate.convert(2.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_quote_rate_is_one() {
        let btc = quote("BTCUSDT", 45000.0);
        let rate = ConversionRate::between(btc.clone(), btc).unwrap();
        assert_eq!(rate.rate, 1.0);
    }

    #[test]
    fn test_outdated_message() {
        let outdated = OutdatedQuotes {
            max_age: Duration::from_secs(60),
        };
        assert_eq!(outdated.message(), "Quotes are older than 60 seconds");
        assert_eq!(OutdatedQuotes::CODE, "quotes_outdated");
    }
}
