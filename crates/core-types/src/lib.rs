pub mod error;
pub mod prices;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use prices::{Close, LookbackWindow, PriceTable, RawPriceData};
pub use structs::{Holding, Portfolio, Ticker};
