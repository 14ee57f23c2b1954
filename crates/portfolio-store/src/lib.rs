//! # Portfolio Store
//!
//! This crate is the portfolio's "permanent archive": a plain `ticker,shares`
//! CSV file that survives between sessions and doubles as the upload/download
//! format.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** all file handling lives here. The rest of the
//!   application only sees validated `Portfolio` values.
//! - **Validate on load:** a file with unknown columns, non-numeric or
//!   non-positive share counts, or duplicate tickers is rejected with the
//!   offending line instead of being partially applied.
//!
//! ## Public API
//!
//! - `PortfolioRepository`: load, save, import and export of the saved portfolio.
//! - `read_portfolio` / `write_portfolio`: the CSV codec over any reader/writer.
//! - `StoreError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod format;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use error::StoreError;
pub use format::{read_portfolio, write_portfolio};
pub use repository::PortfolioRepository;
