use crate::error::StoreError;
use core_types::{Holding, Portfolio};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::{Read, Write};
use std::str::FromStr;

pub const TICKER_HEADER: &str = "ticker";
pub const SHARES_HEADER: &str = "shares";

#[derive(Debug, Deserialize)]
struct HoldingRecord {
    ticker: String,
    shares: String,
}

/// Parses a `ticker,shares` CSV into a validated portfolio.
///
/// The header must name exactly the `ticker` and `shares` columns (in either
/// order). Every row must carry a valid ticker and a positive numeric share
/// count, and tickers must be unique; the first offending line is reported.
pub fn read_portfolio<R: Read>(reader: R) -> Result<Portfolio, StoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut names: Vec<&str> = headers.iter().collect();
    names.sort_unstable();
    if names != [SHARES_HEADER, TICKER_HEADER] {
        return Err(StoreError::InvalidHeader(
            headers.iter().collect::<Vec<_>>().join(","),
        ));
    }

    let mut portfolio = Portfolio::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let row: HoldingRecord =
            record
                .deserialize(Some(&headers))
                .map_err(|e| StoreError::InvalidRow {
                    line,
                    reason: e.to_string(),
                })?;

        let shares = parse_shares(&row.shares).ok_or_else(|| StoreError::InvalidRow {
            line,
            reason: format!("shares '{}' is not a number", row.shares),
        })?;

        Holding::parse(&row.ticker, shares)
            .and_then(|holding| portfolio.add(holding))
            .map_err(|source| StoreError::InvalidHolding { line, source })?;
    }

    Ok(portfolio)
}

/// Writes the portfolio as a `ticker,shares` CSV, header included even when empty.
pub fn write_portfolio<W: Write>(portfolio: &Portfolio, writer: W) -> Result<(), StoreError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([TICKER_HEADER, SHARES_HEADER])?;
    for holding in portfolio.iter() {
        csv_writer.write_record([
            holding.ticker.to_string(),
            holding.shares.normalize().to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn parse_shares(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{CoreError, Ticker};
    use rust_decimal_macros::dec;

    #[test]
    fn reads_valid_portfolio_in_file_order() {
        let csv = "ticker,shares\naapl,10\nMSFT, 2.5\n";

        let portfolio = read_portfolio(csv.as_bytes()).unwrap();

        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio.holdings()[0].ticker, Ticker::new("AAPL").unwrap());
        assert_eq!(portfolio.holdings()[1].shares, dec!(2.5));
    }

    #[test]
    fn accepts_columns_in_either_order() {
        let csv = "shares,ticker\n3,NVDA\n";
        let portfolio = read_portfolio(csv.as_bytes()).unwrap();
        assert_eq!(portfolio.holdings()[0].shares, dec!(3));
    }

    #[test]
    fn rejects_missing_or_unrecognized_headers() {
        for csv in [
            "symbol,shares\nAAPL,1\n",
            "ticker\nAAPL\n",
            "ticker,shares,cost\nAAPL,1,100\n",
        ] {
            let err = read_portfolio(csv.as_bytes()).unwrap_err();
            assert!(matches!(err, StoreError::InvalidHeader(_)), "{csv}");
        }
    }

    #[test]
    fn rejects_non_numeric_shares_with_line_number() {
        let csv = "ticker,shares\nAAPL,10\nMSFT,lots\n";
        let err = read_portfolio(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRow { line: 3, .. }));
    }

    #[test]
    fn rejects_non_positive_shares_and_duplicates() {
        let err = read_portfolio("ticker,shares\nAAPL,0\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidHolding {
                line: 2,
                source: CoreError::NonPositiveShares { .. }
            }
        ));

        let err = read_portfolio("ticker,shares\nAAPL,1\naapl,2\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidHolding {
                line: 3,
                source: CoreError::DuplicateTicker(_)
            }
        ));
    }

    #[test]
    fn rejects_blank_ticker() {
        let err = read_portfolio("ticker,shares\n,5\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidHolding {
                source: CoreError::InvalidTicker(_),
                ..
            }
        ));
    }

    #[test]
    fn written_portfolio_reads_back() {
        let portfolio = Portfolio::from_holdings(vec![
            Holding::parse("AAPL", dec!(10.50)).unwrap(),
            Holding::parse("BRK-B", dec!(1)).unwrap(),
        ])
        .unwrap();

        let mut buffer = Vec::new();
        write_portfolio(&portfolio, &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer.clone()).unwrap(),
            "ticker,shares\nAAPL,10.5\nBRK-B,1\n"
        );
        assert_eq!(read_portfolio(buffer.as_slice()).unwrap(), portfolio);
    }

    #[test]
    fn empty_portfolio_still_writes_a_header() {
        let mut buffer = Vec::new();
        write_portfolio(&Portfolio::new(), &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "ticker,shares\n");
    }
}
