//! HTTP request handlers.

use std::any::Any;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use converter_types::{AppError, ConversionRequest, ConvertQuery, ErrorResponse, QuoteRepository};

use crate::ConversionService;

/// Application state shared across handlers.
pub struct AppState<R: QuoteRepository> {
    pub service: ConversionService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::UnsupportedConversion(msg)
            | AppError::InvalidTimestamp(msg)
            | AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Outdated(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Storage(detail) | AppError::Internal(detail) => {
                tracing::error!(code = self.0.code(), "Conversion failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred during conversion".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: self.0.code().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Turns a handler panic into the opaque internal error body.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError(AppError::Internal(format!("handler panicked: {detail}"))).into_response()
}

/// Root endpoint.
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Crypto Converter API is running",
        "status": "healthy"
    }))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Convert an amount between two symbols sharing a base currency.
#[tracing::instrument(skip(state, query))]
pub async fn convert<R: QuoteRepository>(
    State(state): State<Arc<AppState<R>>>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let request = ConversionRequest::try_from(query).map_err(AppError::from)?;

    let response = state.service.convert(&request).await?;
    tracing::debug!(
        from = %request.from,
        to = %request.to,
        rate = response.rate,
        "Conversion served"
    );

    Ok(Json(response))
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not_found".into(),
            message: "Endpoint not found".into(),
        }),
    )
}
