//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod feed;
mod repository;

pub use feed::{FeedError, PriceFeed};
pub use repository::QuoteRepository;
