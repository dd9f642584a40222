//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use converter_types::dto::{ConvertQuery, ConvertResponse, ErrorResponse};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = inline(serde_json::Value),
         example = json!({"message": "Crypto Converter API is running", "status": "healthy"}))
    )
)]
async fn root() {}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Convert an amount between two symbols
///
/// Without `timestamp` the latest quotes are used and must be at most one
/// freshness window old. With `timestamp` the last quote of that calendar day
/// is used instead, measured in the timestamp's own UTC offset.
#[utoipa::path(
    get,
    path = "/convert",
    tag = "conversion",
    params(ConvertQuery),
    responses(
        (status = 200, description = "Conversion result", body = ConvertResponse),
        (status = 400, description = "Quotes are outdated", body = ErrorResponse),
        (status = 404, description = "No quotes for one of the symbols", body = ErrorResponse),
        (status = 422, description = "Invalid parameters or unsupported pair", body = ErrorResponse),
        (status = 500, description = "Unexpected error", body = ErrorResponse)
    )
)]
async fn convert() {}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Crypto Converter API",
        version = "1.0.0",
        description = "Converts amounts between crypto assets quoted against the same base currency, using prices polled from Binance.",
        license(name = "MIT"),
    ),
    paths(root, health, convert),
    components(schemas(ConvertResponse, ErrorResponse)),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "conversion", description = "Currency conversion"),
    )
)]
pub struct ApiDoc;
