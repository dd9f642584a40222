//! Conversion Application Service
//!
//! Resolves cross rates through the repository port.
//! Contains NO infrastructure logic - pure business orchestration.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};

use converter_types::{
    AppError, ConversionRate, ConversionRequest, ConvertResponse, OutdatedQuotes, QuoteRepository,
    RateResult, Symbol,
};

/// Maximum age of a quote used for a live conversion.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

/// Policy knobs for rate resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    pub freshness_window: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
        }
    }
}

/// Application service for conversion operations.
///
/// Generic over `R: QuoteRepository` - the adapter is injected at compile time.
pub struct ConversionService<R: QuoteRepository> {
    repo: R,
    config: ResolverConfig,
}

impl<R: QuoteRepository> ConversionService<R> {
    /// Creates a new service with the default freshness window.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, ResolverConfig::default())
    }

    pub fn with_config(repo: R, config: ResolverConfig) -> Self {
        Self { repo, config }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolves the rate between two symbols, live or on a historical day.
    pub async fn resolve(
        &self,
        from: &Symbol,
        to: &Symbol,
        at: Option<DateTime<FixedOffset>>,
    ) -> Result<RateResult, AppError> {
        self.resolve_at(from, to, at, Utc::now()).await
    }

    /// Same as [`ConversionService::resolve`], judging freshness against `now`.
    #[tracing::instrument(skip(self, now))]
    pub async fn resolve_at(
        &self,
        from: &Symbol,
        to: &Symbol,
        at: Option<DateTime<FixedOffset>>,
        now: DateTime<Utc>,
    ) -> Result<RateResult, AppError> {
        from.ensure_same_base(to)?;

        let (from_quote, to_quote) = match at {
            Some(ts) => (
                self.repo.get_quote_at(from, ts).await?,
                self.repo.get_quote_at(to, ts).await?,
            ),
            None => (
                self.repo.get_latest_quote(from).await?,
                self.repo.get_latest_quote(to).await?,
            ),
        };

        let (Some(from_quote), Some(to_quote)) = (from_quote, to_quote) else {
            return Ok(RateResult::NotFound);
        };

        // Historical lookups are never stale.
        if at.is_none() {
            let window = self.config.freshness_window;
            if !from_quote.is_fresh_at(now, window) || !to_quote.is_fresh_at(now, window) {
                tracing::debug!(
                    from_ts = %from_quote.timestamp(),
                    to_ts = %to_quote.timestamp(),
                    "Quotes are outdated"
                );
                return Ok(RateResult::Outdated(OutdatedQuotes { max_age: window }));
            }
        }

        Ok(RateResult::Rate(ConversionRate::between(
            from_quote, to_quote,
        )?))
    }

    /// Converts an amount, turning every non-rate outcome into an [`AppError`].
    pub async fn convert(&self, req: &ConversionRequest) -> Result<ConvertResponse, AppError> {
        match self.resolve(&req.from, &req.to, req.timestamp).await? {
            RateResult::Rate(rate) => Ok(ConvertResponse::new(req, &rate)),
            RateResult::NotFound => Err(AppError::NotFound(format!(
                "No quotes available for conversion from {} to {}",
                req.from, req.to
            ))),
            RateResult::Outdated(outdated) => Err(AppError::Outdated(outdated.message())),
        }
    }
}
