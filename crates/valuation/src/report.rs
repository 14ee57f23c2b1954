use crate::error::ValuationError;
use chrono::NaiveDate;
use core_types::{CoreError, Ticker};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One retained trading day of the value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRow {
    pub date: NaiveDate,
    /// Per-asset values in column order; `None` marks a missing price.
    pub values: Vec<Option<Decimal>>,
    /// Sum of the non-missing values. Always backed by at least one value.
    pub total: Decimal,
}

/// Per-asset value series plus a synthetic `Total` column.
///
/// A date only appears in the table when at least one asset has a value on it,
/// so a `Total` of zero always means the holdings were worth zero, never that
/// data was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    tickers: Vec<Ticker>,
    rows: Vec<ValueRow>,
}

impl ValueTable {
    pub fn new(tickers: Vec<Ticker>) -> Result<Self, ValuationError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = tickers.iter().find(|t| !seen.insert(*t)) {
            return Err(CoreError::DuplicateTicker(duplicate.to_string()).into());
        }
        Ok(Self {
            tickers,
            rows: Vec::new(),
        })
    }

    /// Appends a day and computes its total.
    ///
    /// Returns `Ok(false)` without storing anything when every value is missing.
    pub(crate) fn push_row(
        &mut self,
        date: NaiveDate,
        values: Vec<Option<Decimal>>,
    ) -> Result<bool, ValuationError> {
        if let Some(previous) = self.rows.last().map(|r| r.date) {
            if date <= previous {
                return Err(ValuationError::UnorderedDate {
                    previous,
                    next: date,
                });
            }
        }

        if values.iter().all(Option::is_none) {
            return Ok(false);
        }

        let total = values
            .iter()
            .flatten()
            .try_fold(Decimal::ZERO, |sum, value| sum.checked_add(*value))
            .ok_or_else(|| ValuationError::Overflow {
                date,
                what: "total of asset values".to_string(),
            })?;
        self.rows.push(ValueRow {
            date,
            values,
            total,
        });
        Ok(true)
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn rows(&self) -> &[ValueRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&ValueRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&ValueRow> {
        self.rows.last()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    pub fn column(&self, ticker: &Ticker) -> Option<Vec<Option<Decimal>>> {
        let index = self.tickers.iter().position(|t| t == ticker)?;
        Some(self.rows.iter().map(|r| r.values[index]).collect())
    }

    pub fn totals(&self) -> Vec<Decimal> {
        self.rows.iter().map(|r| r.total).collect()
    }
}

/// The current value of one holding on the latest valued date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionEntry {
    pub ticker: Ticker,
    pub value: Decimal,
}

impl CompositionEntry {
    /// Share of `total` held in this position, in percent. `None` when `total` is zero.
    pub fn weight_pct(&self, total: Decimal) -> Option<Decimal> {
        self.value
            .checked_div(total)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    }
}

/// Non-fatal findings attached to a valuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationWarning {
    /// The holding has no price data at all in the requested window.
    UnknownTicker(Ticker),
}

impl fmt::Display for ValuationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuationWarning::UnknownTicker(ticker) => write!(
                f,
                "{ticker}: no price data in this window; excluded from totals and composition"
            ),
        }
    }
}

/// Output of the `ValuationEngine`. Recomputed on every call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub values: ValueTable,

    pub start_date: NaiveDate,
    /// The date `current_total` was observed on.
    pub as_of: NaiveDate,
    pub start_total: Decimal,
    pub current_total: Decimal,

    pub delta_abs: Decimal,
    pub delta_pct: Option<Decimal>, // None when start_total is zero

    pub composition: Vec<CompositionEntry>,
    pub warnings: Vec<ValuationWarning>,
}
