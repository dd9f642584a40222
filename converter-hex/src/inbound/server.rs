//! HTTP Server configuration and startup.

use std::future::Future;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use converter_types::QuoteRepository;

use super::handlers::{self, AppState};
use crate::ConversionService;
use crate::openapi::ApiDoc;

/// HTTP Server for the Crypto Converter API.
pub struct HttpServer<R: QuoteRepository> {
    state: Arc<AppState<R>>,
}

impl<R: QuoteRepository> HttpServer<R> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: ConversionService<R>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
        }
    }

    /// Returns the conversion service behind the handlers.
    pub fn service(&self) -> &ConversionService<R> {
        &self.state.service
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        with_layers(
            Router::new()
                .route("/", get(handlers::root))
                .route("/health", get(handlers::health))
                .route("/convert", get(handlers::convert::<R>))
                .merge(
                    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
                )
                .fallback(handlers::not_found)
                .with_state(self.state.clone()),
        )
    }

    /// Runs the server until `shutdown` completes, then drains open requests.
    pub async fn run<S>(&self, addr: &str, shutdown: S) -> anyhow::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

/// Wraps `router` in the panic boundary, HTTP metrics and request tracing.
pub fn with_layers(router: Router) -> Router {
    // Build HTTP metrics layer (uses globally set MeterProvider)
    let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

    router
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(metrics)
        .layer(TraceLayer::new_for_http())
}
