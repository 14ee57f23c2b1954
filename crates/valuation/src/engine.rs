use crate::error::ValuationError;
use crate::report::{CompositionEntry, ValuationResult, ValuationWarning, ValueRow, ValueTable};
use core_types::{Portfolio, PriceTable};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// A stateless calculator that turns holdings and historical closes into value series.
#[derive(Debug, Default)]
pub struct ValuationEngine {}

impl ValuationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for valuing a portfolio over a price history.
    ///
    /// # Arguments
    ///
    /// * `portfolio` - The holdings to value. Never mutated.
    /// * `prices` - A normalized price table covering the lookback window.
    ///
    /// # Returns
    ///
    /// A `ValuationResult`, or `ValuationError::InsufficientData` when no date
    /// has a usable total. Holdings without any price data do not fail the
    /// valuation; they are reported as `ValuationWarning::UnknownTicker`.
    pub fn calculate(
        &self,
        portfolio: &Portfolio,
        prices: &PriceTable,
    ) -> Result<ValuationResult, ValuationError> {
        if prices.is_empty() {
            return Err(ValuationError::InsufficientData(
                "no price rows in the requested window".to_string(),
            ));
        }

        let (columns, warnings) = self.resolve_columns(portfolio, prices);
        let values = self.build_value_table(portfolio, prices, &columns)?;

        let (first, last) = match (values.first(), values.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(ValuationError::InsufficientData(
                    "none of the held tickers has price data in the requested window".to_string(),
                ));
            }
        };

        let start_total = first.total;
        let current_total = last.total;
        let overflow = |what: &str| ValuationError::Overflow {
            date: last.date,
            what: what.to_string(),
        };
        let delta_abs = current_total
            .checked_sub(start_total)
            .ok_or_else(|| overflow("change since start"))?;
        // A zero start leaves the percent change undefined.
        let delta_pct = if start_total.is_zero() {
            None
        } else {
            let pct = delta_abs
                .checked_div(start_total)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .ok_or_else(|| overflow("percent change since start"))?;
            Some(pct)
        };

        let composition = self.calculate_composition(&values, last);

        Ok(ValuationResult {
            start_date: first.date,
            as_of: last.date,
            start_total,
            current_total,
            delta_abs,
            delta_pct,
            composition,
            warnings,
            values,
        })
    }

    /// Maps each holding to its price column. Holdings whose column is absent or
    /// entirely missing map to `None` and produce a warning.
    fn resolve_columns(
        &self,
        portfolio: &Portfolio,
        prices: &PriceTable,
    ) -> (Vec<Option<usize>>, Vec<ValuationWarning>) {
        let mut warnings = Vec::new();

        let columns = portfolio
            .iter()
            .map(|holding| {
                let column = prices
                    .column_index(&holding.ticker)
                    .filter(|&i| prices.rows().any(|(_, closes)| closes[i].is_some()));

                if column.is_none() {
                    warn!(ticker = %holding.ticker, "No price data for holding; excluding it");
                    warnings.push(ValuationWarning::UnknownTicker(holding.ticker.clone()));
                }
                column
            })
            .collect();

        (columns, warnings)
    }

    /// Multiplies every close by the share count and totals each date.
    fn build_value_table(
        &self,
        portfolio: &Portfolio,
        prices: &PriceTable,
        columns: &[Option<usize>],
    ) -> Result<ValueTable, ValuationError> {
        let mut table = ValueTable::new(portfolio.tickers())?;
        let mut skipped = 0usize;

        for (date, closes) in prices.rows() {
            let values = portfolio
                .iter()
                .zip(columns)
                .map(|(holding, column)| {
                    column
                        .and_then(|i| closes[i])
                        .map(|close| {
                            close.checked_mul(holding.shares).ok_or_else(|| {
                                ValuationError::Overflow {
                                    date,
                                    what: format!("value of {}", holding.ticker),
                                }
                            })
                        })
                        .transpose()
                })
                .collect::<Result<Vec<_>, _>>()?;

            if !table.push_row(date, values)? {
                skipped += 1;
            }
        }

        if skipped > 0 {
            debug!(skipped, "Excluded dates where no holding had a price");
        }
        Ok(table)
    }

    /// Breaks the latest total down by holding. Holdings without a current value are left out.
    fn calculate_composition(&self, values: &ValueTable, latest: &ValueRow) -> Vec<CompositionEntry> {
        values
            .tickers()
            .iter()
            .zip(&latest.values)
            .filter_map(|(ticker, value)| {
                value.map(|value| CompositionEntry {
                    ticker: ticker.clone(),
                    value,
                })
            })
            .collect()
    }
}

/// Values `portfolio` against `prices` with a fresh engine.
pub fn compute_valuation(
    portfolio: &Portfolio,
    prices: &PriceTable,
) -> Result<ValuationResult, ValuationError> {
    ValuationEngine::new().calculate(portfolio, prices)
}
