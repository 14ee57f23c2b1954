use crate::error::ValuationError;
use chrono::NaiveDate;
use core_types::{Close, PriceTable, RawPriceData, Ticker};
use std::collections::HashSet;
use tracing::debug;

/// Brings raw provider output into one canonical shape: a date-indexed table
/// with exactly one column per requested ticker, in request order.
///
/// - A single series is promoted to a one-column table named by the sole requested ticker.
/// - A requested ticker the provider knows nothing about becomes an all-missing column.
/// - Provider columns that were not requested are discarded.
/// - Rows where every requested ticker is missing (exchange holidays) are dropped.
pub fn normalize_prices(
    raw: RawPriceData,
    requested: &[Ticker],
) -> Result<PriceTable, ValuationError> {
    let requested = dedup(requested);

    let table = match raw {
        RawPriceData::Series(points) => promote_series(points, &requested)?,
        RawPriceData::Table(table) => select_columns(&table, &requested)?,
    };

    debug!(
        rows = table.len(),
        columns = table.tickers().len(),
        "Normalized price matrix"
    );
    Ok(table)
}

fn dedup(requested: &[Ticker]) -> Vec<Ticker> {
    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|t| seen.insert(*t))
        .cloned()
        .collect()
}

fn promote_series(
    mut points: Vec<(NaiveDate, Close)>,
    requested: &[Ticker],
) -> Result<PriceTable, ValuationError> {
    if requested.len() != 1 {
        return Err(ValuationError::AmbiguousSeries(requested.len()));
    }

    points.sort_by_key(|(date, _)| *date);
    if let Some(pair) = points.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(ValuationError::DuplicateDate(pair[0].0));
    }

    let mut table = PriceTable::new(requested.to_vec())?;
    for (date, close) in points {
        if close.is_some() {
            table.push_row(date, vec![close])?;
        }
    }
    Ok(table)
}

fn select_columns(
    source: &PriceTable,
    requested: &[Ticker],
) -> Result<PriceTable, ValuationError> {
    let sources: Vec<Option<usize>> = requested
        .iter()
        .map(|ticker| source.column_index(ticker))
        .collect();

    let mut table = PriceTable::new(requested.to_vec())?;
    let mut dropped = 0usize;
    for (date, closes) in source.rows() {
        let row: Vec<Close> = sources
            .iter()
            .map(|index| index.and_then(|i| closes[i]))
            .collect();

        if row.iter().all(Option::is_none) {
            dropped += 1;
            continue;
        }
        table.push_row(date, row)?;
    }

    if dropped > 0 {
        debug!(dropped, "Dropped dates with no data for any requested ticker");
    }
    Ok(table)
}
