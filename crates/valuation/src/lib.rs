//! # Valuation Engine
//!
//! This crate turns a portfolio of holdings and a history of daily closes into
//! per-asset value series, a running total, first/last delta metrics and a
//! current allocation breakdown.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of files,
//!   market-data vendors or terminals. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `ValuationEngine` takes the portfolio and a
//!   price table as explicit parameters and produces a `ValuationResult`. The
//!   same inputs always produce the same output.
//! - **Missing is not zero:** a price gap stays `None` from the price table all
//!   the way into the value table. Dates with no value for any holding are left
//!   out instead of being reported as a zero total.
//!
//! ## Public API
//!
//! - `normalize_prices`: promotes raw provider output to a canonical `PriceTable`.
//! - `ValuationEngine` / `compute_valuation`: the valuation itself.
//! - `ValuationResult`, `ValueTable`: the outputs.
//! - `write_value_table` / `read_value_table`: CSV dump of a `ValueTable`.
//! - `ValuationError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{compute_valuation, ValuationEngine};
pub use error::ValuationError;
pub use export::{read_value_table, write_value_table};
pub use normalizer::normalize_prices;
pub use report::{CompositionEntry, ValuationResult, ValuationWarning, ValueRow, ValueTable};
