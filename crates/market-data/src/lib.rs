use crate::error::MarketDataError;
use async_trait::async_trait;
use core_types::{LookbackWindow, RawPriceData, Ticker};

pub mod csv_provider;
pub mod error;

// --- Public API ---
pub use csv_provider::CsvPriceProvider;

/// The generic, abstract interface for a historical price source.
/// This trait is the contract the session uses, allowing the underlying
/// implementation (files, a vendor API, or a test stub) to be swapped out.
///
/// Providers return prices in whatever shape they naturally produce; turning
/// that into a canonical table is the normalizer's job, not theirs.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches daily closes for `tickers` on the trading days inside `window`.
    async fn fetch_closes(
        &self,
        tickers: &[Ticker],
        window: &LookbackWindow,
    ) -> Result<RawPriceData, MarketDataError>;

    /// Whether the provider has at least one close on record for `ticker`.
    async fn has_history(&self, ticker: &Ticker) -> Result<bool, MarketDataError>;
}
