use crate::error::CoreError;
use crate::structs::Ticker;
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A daily close, or `None` when the instrument did not trade or has no data.
pub type Close = Option<Decimal>;

/// A date-indexed table of closing prices with one column per ticker.
///
/// Dates are strictly increasing and every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    tickers: Vec<Ticker>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<Close>>,
}

impl PriceTable {
    pub fn new(tickers: Vec<Ticker>) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        for ticker in &tickers {
            if !seen.insert(ticker) {
                return Err(CoreError::DuplicateTicker(ticker.to_string()));
            }
        }
        Ok(Self {
            tickers,
            dates: Vec::new(),
            rows: Vec::new(),
        })
    }

    /// Appends one trading day. The date must be later than every date already in the table.
    pub fn push_row(&mut self, date: NaiveDate, closes: Vec<Close>) -> Result<(), CoreError> {
        if closes.len() != self.tickers.len() {
            return Err(CoreError::RowWidth {
                date,
                expected: self.tickers.len(),
                actual: closes.len(),
            });
        }
        if let Some(&previous) = self.dates.last() {
            if date <= previous {
                return Err(CoreError::UnorderedDate {
                    previous,
                    next: date,
                });
            }
        }
        self.dates.push(date);
        self.rows.push(closes);
        Ok(())
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_index(&self, ticker: &Ticker) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Returns the full close series for `ticker`, or `None` if it is not a column.
    pub fn column(&self, ticker: &Ticker) -> Option<Vec<Close>> {
        let index = self.column_index(ticker)?;
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[Close])> {
        self.dates
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// Keeps only the rows whose date falls inside `window`.
    pub fn within(&self, window: &LookbackWindow) -> PriceTable {
        let (dates, rows) = self
            .rows()
            .filter(|(date, _)| window.contains(*date))
            .map(|(date, closes)| (date, closes.to_vec()))
            .unzip();
        PriceTable {
            tickers: self.tickers.clone(),
            dates,
            rows,
        }
    }
}

/// The shapes a market-data provider may hand back for a close-price request.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPriceData {
    /// A single unnamed series; providers answer this way when exactly one ticker was requested.
    Series(Vec<(NaiveDate, Close)>),
    /// A table keyed by ticker; columns may be missing or extra relative to the request.
    Table(PriceTable),
}

/// A trailing range of calendar days: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    /// The `days` calendar days before `end`. `end` itself is excluded so that only
    /// completed sessions are valued.
    pub fn ending_on(end: NaiveDate, days: u32) -> Result<Self, CoreError> {
        if days == 0 {
            return Err(CoreError::InvalidInput(
                "lookback_days".to_string(),
                "must be at least one day".to_string(),
            ));
        }
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                CoreError::InvalidInput("lookback_days".to_string(), days.to_string())
            })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}
