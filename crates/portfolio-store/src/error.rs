use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Portfolio CSV must have exactly the columns 'ticker' and 'shares', found: {0}")]
    InvalidHeader(String),

    #[error("Portfolio CSV line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("Portfolio CSV line {line}: {source}")]
    InvalidHolding {
        line: u64,
        #[source]
        source: CoreError,
    },

    #[error("Failed to read or write portfolio CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Portfolio file I/O error: {0}")]
    Io(#[from] std::io::Error),
}
