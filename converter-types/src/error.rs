//! Error types for the conversion service.

use crate::domain::Symbol;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(
        "Cross-currency conversion from {from} to {to} is not supported. Both currencies must share the same base currency."
    )]
    UnsupportedConversion { from: Symbol, to: Symbol },

    #[error("Timestamp must be in ISO format (e.g., '2023-01-01T12:00:00Z'), got '{0}'")]
    InvalidTimestamp(String),

    #[error("Price must be positive, got {0}")]
    NonPositivePrice(f64),

    #[error("Cannot divide by the price of {0}")]
    DivisionByZero(Symbol),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),
}

/// Application-level errors (for HTTP responses).
///
/// Each variant carries a stable machine-readable code, see [`AppError::code`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    UnsupportedConversion(String),

    #[error("{0}")]
    InvalidTimestamp(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Outdated(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Error code reported to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnsupportedConversion(_) => "unsupported_conversion",
            AppError::InvalidTimestamp(_) => "invalid_timestamp",
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "quotes_not_found",
            AppError::Outdated(_) => "quotes_outdated",
            AppError::Storage(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnsupportedConversion { .. } => {
                AppError::UnsupportedConversion(err.to_string())
            }
            DomainError::InvalidTimestamp(_) => AppError::InvalidTimestamp(err.to_string()),
            DomainError::ValidationError(msg) => AppError::Validation(msg),
            DomainError::NonPositivePrice(_) | DomainError::DivisionByZero(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => AppError::Internal(e.to_string()),
            RepoError::Database(e) => AppError::Storage(e),
        }
    }
}
