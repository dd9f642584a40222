//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ConversionRate, Symbol, parse_timestamp};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Conversion DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Raw query parameters of `GET /convert`.
///
/// Everything arrives as text so that malformed values produce a JSON error
/// body instead of a framework rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertQuery {
    /// Amount to convert, must be positive
    #[param(required = true, example = "1.5")]
    pub amount: Option<String>,
    /// Source currency symbol (case-insensitive)
    #[param(required = true, example = "BTCUSDT")]
    pub from: Option<String>,
    /// Target currency symbol (case-insensitive)
    #[param(required = true, example = "ETHUSDT")]
    pub to: Option<String>,
    /// Optional ISO-8601 timestamp for a historical conversion
    #[param(example = "2024-01-01T12:00:00Z")]
    pub timestamp: Option<String>,
}

/// Typed conversion request, produced from [`ConvertQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: Symbol,
    pub to: Symbol,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl TryFrom<ConvertQuery> for ConversionRequest {
    type Error = DomainError;

    fn try_from(query: ConvertQuery) -> Result<Self, Self::Error> {
        let amount = query
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DomainError::ValidationError("Parameter 'amount' is required".into()))?
            .parse::<f64>()
            .map_err(|_| DomainError::ValidationError("Amount must be a number".into()))?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(DomainError::ValidationError(
                "Amount must be greater than 0".into(),
            ));
        }

        let from = required_symbol(query.from.as_deref(), "from")?;
        let to = required_symbol(query.to.as_deref(), "to")?;

        let timestamp = match query.timestamp.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_timestamp(raw)?),
        };

        Ok(Self {
            amount,
            from,
            to,
            timestamp,
        })
    }
}

fn required_symbol(raw: Option<&str>, name: &str) -> Result<Symbol, DomainError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => Symbol::parse(raw),
        _ => Err(DomainError::ValidationError(format!(
            "Parameter '{}' is required",
            name
        ))),
    }
}

/// Successful conversion response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    /// Original amount
    #[schema(example = 1.0)]
    pub amount: f64,
    /// Source currency symbol
    #[schema(example = "BTCUSDT")]
    pub from_currency: String,
    /// Target currency symbol
    #[schema(example = "ETHUSDT")]
    pub to_currency: String,
    /// Amount expressed in the target currency
    #[schema(example = 15.0)]
    pub converted_amount: f64,
    /// Units of target currency per unit of source currency
    #[schema(example = 15.0)]
    pub rate: f64,
    /// Time of the source quote (ISO 8601)
    #[schema(value_type = String, example = "2024-01-01T12:00:00.000000Z")]
    pub timestamp: DateTime<Utc>,
}

impl ConvertResponse {
    pub fn new(request: &ConversionRequest, rate: &ConversionRate) -> Self {
        Self {
            amount: request.amount,
            from_currency: request.from.to_string(),
            to_currency: request.to.to_string(),
            converted_amount: rate.convert(request.amount),
            rate: rate.rate,
            timestamp: rate.from_quote.timestamp(),
        }
    }
}

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "unsupported_conversion")]
    pub error: String,
    /// Human-readable message
    pub message: String,
}
