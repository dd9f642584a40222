//! Domain models for the conversion service.

pub mod quote;
pub mod rate;
pub mod symbol;
pub mod ticker;
pub mod timestamp;

pub use quote::{DayWindow, Quote};
pub use rate::{ConversionRate, OutdatedQuotes, RateResult};
pub use symbol::Symbol;
pub use ticker::TickerEntry;
pub use timestamp::parse_timestamp;
