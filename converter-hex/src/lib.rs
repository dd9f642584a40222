//! # Converter Hex
//!
//! Application services and the HTTP adapter for the crypto converter.
//!
//! ## Architecture
//!
//! - `service/` - Rate resolution (orchestrates quote lookups)
//! - `ingester/` - Periodic quote polling, buffering and retention
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Everything is generic over the `QuoteRepository` and `PriceFeed` ports,
//! allowing different adapters to be injected.

pub mod inbound;
pub mod ingester;
pub mod openapi;
pub mod service;
pub mod shutdown;


pub use ingester::{IngestConfig, QuoteBuffer, QuoteIngester};
pub use service::{ConversionService, ResolverConfig};
