use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building holdings, portfolios and price tables.
///
/// The holding variants are what the ingestion layer reports when it rejects
/// user input; none of them ever reach the valuation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid ticker '{0}': must be non-empty and contain only letters, digits, '.', '-', '^' or '='")]
    InvalidTicker(String),

    #[error("Invalid share count for {ticker}: {shares} (must be greater than zero)")]
    NonPositiveShares { ticker: String, shares: String },

    #[error("{0} is already in the portfolio")]
    DuplicateTicker(String),

    #[error("{0} is not in the portfolio")]
    HoldingNotFound(String),

    #[error("Price table dates must be strictly increasing: {next} does not follow {previous}")]
    UnorderedDate { previous: NaiveDate, next: NaiveDate },

    #[error("Price row for {date} has {actual} values but the table has {expected} columns")]
    RowWidth {
        date: NaiveDate,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
