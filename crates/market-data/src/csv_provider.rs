use crate::PriceProvider;
use crate::error::MarketDataError;
use async_trait::async_trait;
use chrono::NaiveDate;
use core_types::{Close, LookbackWindow, PriceTable, RawPriceData, Ticker};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Serves daily closes from a directory of `<TICKER>.csv` files.
///
/// Each file has a `date,close` header (case-insensitive, extra columns
/// ignored). An empty, `null` or `NaN` close marks a day without data. A ticker
/// without a file is simply unknown to the provider.
///
/// Mirrors the answer shape of typical market-data vendors: a single series
/// when one ticker is requested, a ticker-keyed table otherwise.
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    root: PathBuf,
}

impl CsvPriceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_for(&self, ticker: &Ticker) -> PathBuf {
        self.root.join(format!("{ticker}.csv"))
    }

    /// Reads one ticker's full history. `Ok(None)` when the provider has no file for it.
    async fn load_series(
        &self,
        ticker: &Ticker,
    ) -> Result<Option<Vec<(NaiveDate, Close)>>, MarketDataError> {
        let path = self.file_for(ticker);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%ticker, "No price file");
                return Ok(None);
            }
            Err(source) => return Err(MarketDataError::Io { path, source }),
        };
        parse_series(&path, &bytes).map(Some)
    }
}

#[async_trait]
impl PriceProvider for CsvPriceProvider {
    async fn fetch_closes(
        &self,
        tickers: &[Ticker],
        window: &LookbackWindow,
    ) -> Result<RawPriceData, MarketDataError> {
        // 1. Concurrently load every requested ticker's history.
        let results = join_all(tickers.iter().map(|ticker| self.load_series(ticker))).await;

        // 2. Keep the tickers we know about, restricted to the window.
        let mut found = Vec::new();
        for (ticker, result) in tickers.iter().zip(results) {
            if let Some(series) = result? {
                let in_window: Vec<_> = series
                    .into_iter()
                    .filter(|(date, _)| window.contains(*date))
                    .collect();
                found.push((ticker.clone(), in_window));
            }
        }
        info!(
            requested = tickers.len(),
            found = found.len(),
            start = %window.start,
            end = %window.end,
            "Loaded price history"
        );

        // 3. Answer in the vendor's shape.
        if tickers.len() == 1 {
            let series = found.pop().map(|(_, series)| series).unwrap_or_default();
            return Ok(RawPriceData::Series(series));
        }

        let width = found.len();
        let mut by_date: BTreeMap<NaiveDate, Vec<Close>> = BTreeMap::new();
        for (column, (_, series)) in found.iter().enumerate() {
            for (date, close) in series {
                by_date.entry(*date).or_insert_with(|| vec![None; width])[column] = *close;
            }
        }

        let mut table = PriceTable::new(found.into_iter().map(|(ticker, _)| ticker).collect())?;
        for (date, closes) in by_date {
            table.push_row(date, closes)?;
        }
        Ok(RawPriceData::Table(table))
    }

    async fn has_history(&self, ticker: &Ticker) -> Result<bool, MarketDataError> {
        Ok(self
            .load_series(ticker)
            .await?
            .is_some_and(|series| series.iter().any(|(_, close)| close.is_some())))
    }
}

fn parse_series(path: &Path, bytes: &[u8]) -> Result<Vec<(NaiveDate, Close)>, MarketDataError> {
    let invalid = |line: u64, reason: String| MarketDataError::InvalidData {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = reader.headers()?.clone();
    let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (date_col, close_col) = match (position("date"), position("close")) {
        (Some(d), Some(c)) => (d, c),
        _ => return Err(invalid(1, "expected 'date' and 'close' columns".to_string())),
    };

    let mut series = Vec::new();
    let mut first_seen: HashMap<NaiveDate, u64> = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let raw_date = record.get(date_col).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| invalid(line, format!("invalid date '{raw_date}': {e}")))?;
        if let Some(first) = first_seen.insert(date, line) {
            return Err(invalid(
                line,
                format!("date {date} already appears at line {first}"),
            ));
        }

        let raw_close = record.get(close_col).unwrap_or_default();
        let close = if raw_close.is_empty()
            || raw_close.eq_ignore_ascii_case("null")
            || raw_close.eq_ignore_ascii_case("nan")
        {
            None
        } else {
            Some(
                Decimal::from_str(raw_close)
                    .map_err(|e| invalid(line, format!("invalid close '{raw_close}': {e}")))?,
            )
        };
        series.push((date, close));
    }

    series.sort_by_key(|(date, _)| *date);
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn ticker(symbol: &str) -> Ticker {
        Ticker::new(symbol).unwrap()
    }

    fn provider_with(files: &[(&str, &str)]) -> (tempfile::TempDir, CsvPriceProvider) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        let provider = CsvPriceProvider::new(dir.path());
        (dir, provider)
    }

    fn window() -> LookbackWindow {
        LookbackWindow::ending_on(date(10), 8).unwrap()
    }

    #[tokio::test]
    async fn single_ticker_is_answered_as_a_series_within_the_window() {
        let (_dir, provider) = provider_with(&[(
            "AAPL.csv",
            "Date,Open,Close\n2024-05-01,1,99\n2024-05-03,1,101\n2024-05-02,1,\n2024-05-10,1,105\n",
        )]);

        let raw = provider.fetch_closes(&[ticker("AAPL")], &window()).await.unwrap();

        assert_eq!(
            raw,
            RawPriceData::Series(vec![(date(2), None), (date(3), Some(dec!(101)))])
        );
    }

    #[tokio::test]
    async fn several_tickers_are_merged_by_date() {
        let (_dir, provider) = provider_with(&[
            ("AAPL.csv", "date,close\n2024-05-02,100\n2024-05-03,101\n"),
            ("MSFT.csv", "date,close\n2024-05-03,200\n2024-05-06,NaN\n"),
        ]);

        let raw = provider
            .fetch_closes(&[ticker("AAPL"), ticker("MSFT"), ticker("ZZZZ")], &window())
            .await
            .unwrap();

        let RawPriceData::Table(table) = raw else {
            panic!("expected a table");
        };
        assert_eq!(table.tickers(), &[ticker("AAPL"), ticker("MSFT")]);
        assert_eq!(table.dates(), &[date(2), date(3), date(6)]);
        assert_eq!(
            table.column(&ticker("MSFT")).unwrap(),
            vec![None, Some(dec!(200)), None]
        );
    }

    #[tokio::test]
    async fn unknown_single_ticker_yields_an_empty_series() {
        let (_dir, provider) = provider_with(&[]);
        let raw = provider.fetch_closes(&[ticker("ZZZZ")], &window()).await.unwrap();
        assert_eq!(raw, RawPriceData::Series(vec![]));
    }

    #[tokio::test]
    async fn malformed_close_reports_file_and_line() {
        let (_dir, provider) = provider_with(&[(
            "AAPL.csv",
            "date,close\n2024-05-02,100\n2024-05-03,abc\n",
        )]);

        let err = provider
            .fetch_closes(&[ticker("AAPL")], &window())
            .await
            .unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidData { line: 3, .. }));
    }

    #[tokio::test]
    async fn repeated_date_reports_the_line_of_the_repeat() {
        let (_dir, provider) = provider_with(&[(
            "AAPL.csv",
            "date,close\n2024-05-03,101\n2024-05-02,100\n2024-05-03,102\n",
        )]);

        let err = provider
            .fetch_closes(&[ticker("AAPL")], &window())
            .await
            .unwrap_err();
        match err {
            MarketDataError::InvalidData { line, reason, .. } => {
                assert_eq!(line, 4);
                assert!(reason.contains("line 2"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn has_history_requires_at_least_one_close() {
        let (_dir, provider) = provider_with(&[
            ("AAPL.csv", "date,close\n2024-05-02,100\n"),
            ("DEAD.csv", "date,close\n2024-05-02,\n"),
        ]);

        assert!(provider.has_history(&ticker("AAPL")).await.unwrap());
        assert!(!provider.has_history(&ticker("DEAD")).await.unwrap());
        assert!(!provider.has_history(&ticker("NONE")).await.unwrap());
    }
}
