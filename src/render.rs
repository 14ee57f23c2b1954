use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use core_types::Portfolio;
use rust_decimal::{Decimal, RoundingStrategy};
use valuation::ValuationResult;

pub fn print_holdings(portfolio: &Portfolio) {
    if portfolio.is_empty() {
        println!("No stocks added yet.");
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Ticker", "Shares"]);
    for holding in portfolio.iter() {
        table.add_row(vec![
            Cell::new(&holding.ticker),
            Cell::new(holding.shares.normalize()).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{table}");
}

/// Prints the headline metric, the most recent `rows` days of values, the allocation and any warnings.
pub fn print_valuation(result: &ValuationResult, days: u32, rows: usize) {
    println!(
        "Current Portfolio Value: {}  {}",
        format_money(result.current_total),
        format_delta(result.delta_abs, result.delta_pct)
    );
    println!(
        "Past {days} days: {} to {} ({} trading days)",
        result.start_date,
        result.as_of,
        result.values.len()
    );

    println!("\nValue by Asset Over Time");
    let mut history = Table::new();
    let mut header = vec!["Date".to_string()];
    header.extend(result.values.tickers().iter().map(|t| t.to_string()));
    header.push("Total Value".to_string());
    history.load_preset(UTF8_FULL).set_header(header);

    let skip = result.values.len().saturating_sub(rows);
    for row in result.values.rows().iter().skip(skip) {
        let mut cells = vec![Cell::new(row.date)];
        cells.extend(row.values.iter().map(|value| {
            let text = value.map(format_money).unwrap_or_else(|| "-".to_string());
            Cell::new(text).set_alignment(CellAlignment::Right)
        }));
        cells.push(Cell::new(format_money(row.total)).set_alignment(CellAlignment::Right));
        history.add_row(cells);
    }
    println!("{history}");

    println!("\nCurrent Allocation ({})", result.as_of);
    let mut allocation = Table::new();
    allocation
        .load_preset(UTF8_FULL)
        .set_header(vec!["Ticker", "Value", "Weight"]);
    for entry in &result.composition {
        let weight = entry
            .weight_pct(result.current_total)
            .map(|w| format!("{}%", w.round_dp(2)))
            .unwrap_or_else(|| "n/a".to_string());
        allocation.add_row(vec![
            Cell::new(&entry.ticker),
            Cell::new(format_money(entry.value)).set_alignment(CellAlignment::Right),
            Cell::new(weight).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{allocation}");

    for warning in &result.warnings {
        println!("warning: {warning}");
    }
}

/// `$1,234.56`, with a leading minus for negative amounts.
pub fn format_money(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${}", group_thousands(amount.abs()))
}

/// `+150.00 (7.50%)`, or `+150.00 (n/a)` when the percent change is undefined.
pub fn format_delta(delta_abs: Decimal, delta_pct: Option<Decimal>) -> String {
    let sign = if delta_abs.is_sign_negative() && !delta_abs.is_zero() {
        "-"
    } else {
        "+"
    };
    let pct = delta_pct
        .map(|p| format!("{:.2}%", p.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)))
        .unwrap_or_else(|| "n/a".to_string());
    format!("{sign}{} ({pct})", group_thousands(delta_abs.abs()))
}

fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{rounded:.2}");
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_is_grouped_and_rounded() {
        assert_eq!(format_money(dec!(2150)), "$2,150.00");
        assert_eq!(format_money(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_money(dec!(999.995)), "$1,000.00");
        assert_eq!(format_money(dec!(-42.5)), "-$42.50");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn delta_shows_sign_and_percent() {
        assert_eq!(format_delta(dec!(150), Some(dec!(7.5))), "+150.00 (7.50%)");
        assert_eq!(format_delta(dec!(-1200), Some(dec!(-3.333))), "-1,200.00 (-3.33%)");
        assert_eq!(format_delta(dec!(50), None), "+50.00 (n/a)");
    }
}
