//! Observed prices and the calendar-day window used for historical lookups.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::domain::Symbol;
use crate::error::DomainError;

/// One observed price for a symbol at a point in time.
///
/// Quotes are immutable facts: they are inserted and deleted, never updated.
/// The price is guaranteed to be finite and strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    symbol: Symbol,
    price: f64,
    timestamp: DateTime<Utc>,
}

impl Quote {
    /// Creates a new quote, rejecting non-positive or non-finite prices.
    pub fn new(symbol: Symbol, price: f64, timestamp: DateTime<Utc>) -> Result<Self, DomainError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(DomainError::NonPositivePrice(price));
        }
        Ok(Self {
            symbol,
            price,
            timestamp,
        })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns true if the quote is no older than `max_age` at `now`.
    ///
    /// Quotes stamped in the future count as fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.timestamp) <= max_age
    }
}

/// Half-open UTC interval `[start, end)` covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The calendar day containing `at`, measured in `at`'s own UTC offset.
    pub fn containing(at: DateTime<FixedOffset>) -> Self {
        let local_midnight = at.date_naive().and_time(NaiveTime::MIN);
        let offset = TimeDelta::seconds(i64::from(at.offset().local_minus_utc()));
        let start = (local_midnight - offset).and_utc();
        Self {
            start,
            end: start + TimeDelta::days(1),
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}
