//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the conversion service.

pub(crate) mod handlers;
mod server;

pub use handlers::ApiError;
pub use server::{HttpServer, with_layers};
