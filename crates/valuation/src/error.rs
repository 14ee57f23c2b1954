use chrono::NaiveDate;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("Cannot value portfolio for this window: {0}")]
    InsufficientData(String),

    #[error("Value overflow on {date}: {what}")]
    Overflow { date: NaiveDate, what: String },

    #[error("A single price series needs exactly one requested ticker, got {0}")]
    AmbiguousSeries(usize),

    #[error("Price series contains the date {0} more than once")]
    DuplicateDate(NaiveDate),

    #[error("Value table dates must be strictly increasing: {next} does not follow {previous}")]
    UnorderedDate { previous: NaiveDate, next: NaiveDate },

    #[error("Malformed value table at line {line}: {reason}")]
    MalformedTable { line: u64, reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
