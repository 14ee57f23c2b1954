//! Textual dump of a `ValueTable`.
//!
//! The format is plain CSV with a `date` column, one column per ticker and a
//! trailing `Total` column. Missing values are written as empty cells, so a
//! dumped table reads back into an identical `ValueTable`.

use crate::error::ValuationError;
use crate::report::ValueTable;
use chrono::NaiveDate;
use core_types::{CoreError, Ticker};
use rust_decimal::Decimal;
use std::io::{Read, Write};
use std::str::FromStr;

pub const DATE_HEADER: &str = "date";
pub const TOTAL_HEADER: &str = "Total";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn write_value_table<W: Write>(table: &ValueTable, writer: W) -> Result<(), ValuationError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![DATE_HEADER.to_string()];
    header.extend(table.tickers().iter().map(Ticker::to_string));
    header.push(TOTAL_HEADER.to_string());
    csv_writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.date.format(DATE_FORMAT).to_string()];
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        record.push(row.total.to_string());
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn read_value_table<R: Read>(reader: R) -> Result<ValueTable, ValuationError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = headers.len();
    if columns < 3
        || &headers[0] != DATE_HEADER
        || &headers[columns - 1] != TOTAL_HEADER
    {
        return Err(ValuationError::MalformedTable {
            line: 1,
            reason: format!(
                "expected header '{DATE_HEADER},<tickers>...,{TOTAL_HEADER}', found '{}'",
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }

    let tickers = headers
        .iter()
        .skip(1)
        .take(columns - 2)
        .map(Ticker::new)
        .collect::<Result<Vec<_>, _>>()?;
    let mut table = match ValueTable::new(tickers) {
        Err(ValuationError::Core(CoreError::DuplicateTicker(ticker))) => {
            return Err(ValuationError::MalformedTable {
                line: 1,
                reason: format!("ticker column {ticker} appears more than once"),
            });
        }
        table => table?,
    };

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let malformed = |reason: String| ValuationError::MalformedTable { line, reason };

        let date = NaiveDate::parse_from_str(&record[0], DATE_FORMAT)
            .map_err(|e| malformed(format!("invalid date '{}': {e}", &record[0])))?;

        let mut values = Vec::with_capacity(columns - 2);
        for cell in record.iter().skip(1).take(columns - 2) {
            values.push(parse_cell(cell).map_err(&malformed)?);
        }
        let total = parse_cell(&record[columns - 1])
            .map_err(&malformed)?
            .ok_or_else(|| malformed("missing total".to_string()))?;

        if !table.push_row(date, values)? {
            return Err(malformed(format!("no asset values on {date}")));
        }
        let computed = table.last().map(|r| r.total).unwrap_or_default();
        if computed != total {
            return Err(malformed(format!(
                "total {total} does not match the sum of asset values {computed}"
            )));
        }
    }

    Ok(table)
}

fn parse_cell(cell: &str) -> Result<Option<Decimal>, String> {
    if cell.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(cell)
        .map(Some)
        .map_err(|e| format!("invalid number '{cell}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_valuation;
    use core_types::{Holding, Portfolio, PriceTable};
    use rust_decimal_macros::dec;

    fn sample_table() -> ValueTable {
        let portfolio = Portfolio::from_holdings(vec![
            Holding::parse("AAPL", dec!(10)).unwrap(),
            Holding::parse("MSFT", dec!(5)).unwrap(),
        ])
        .unwrap();
        let mut prices = PriceTable::new(portfolio.tickers()).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2024, 6, day).unwrap();
        prices.push_row(d(3), vec![Some(dec!(100)), None]).unwrap();
        prices
            .push_row(d(4), vec![Some(dec!(110.25)), Some(dec!(210))])
            .unwrap();
        compute_valuation(&portfolio, &prices).unwrap().values
    }

    #[test]
    fn dump_marks_missing_values_as_empty_cells() {
        let mut buffer = Vec::new();
        write_value_table(&sample_table(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,AAPL,MSFT,Total");
        assert_eq!(lines[1], "2024-06-03,1000,,1000");
        assert_eq!(lines[2], "2024-06-04,1102.50,1050,2152.50");
    }

    #[test]
    fn dump_reads_back_into_the_same_table() {
        let table = sample_table();
        let mut buffer = Vec::new();
        write_value_table(&table, &mut buffer).unwrap();

        let parsed = read_value_table(buffer.as_slice()).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn inconsistent_total_is_rejected() {
        let text = "date,AAPL,Total\n2024-06-03,1000,999\n";
        let err = read_value_table(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ValuationError::MalformedTable { line: 2, .. }));
    }

    #[test]
    fn duplicate_ticker_columns_are_rejected() {
        let text = "date,AAPL,aapl,Total\n2024-06-03,1000,1000,2000\n";
        let err = read_value_table(text.as_bytes()).unwrap_err();
        match err {
            ValuationError::MalformedTable { line, reason } => {
                assert_eq!(line, 1);
                assert!(reason.contains("AAPL appears more than once"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unexpected_header_is_rejected() {
        let text = "day,AAPL,Total\n2024-06-03,1000,1000\n";
        let err = read_value_table(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ValuationError::MalformedTable { line: 1, .. }));
    }
}
