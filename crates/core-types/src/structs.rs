use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A normalized equity ticker symbol.
///
/// The only way to obtain a `Ticker` is through [`Ticker::new`], which trims
/// and upper-cases the input, so two tickers compare equal exactly when they
/// refer to the same instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn new(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_uppercase();
        let valid_chars = normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));

        if normalized.is_empty() || !valid_chars {
            return Err(CoreError::InvalidTicker(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single ticker + share-count pair within a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: Ticker,
    pub shares: Decimal,
}

impl Holding {
    /// Validates the share count and builds a holding. Fractional shares are allowed.
    pub fn new(ticker: Ticker, shares: Decimal) -> Result<Self, CoreError> {
        if shares <= Decimal::ZERO {
            return Err(CoreError::NonPositiveShares {
                ticker: ticker.to_string(),
                shares: shares.to_string(),
            });
        }
        Ok(Self { ticker, shares })
    }

    /// Parses and normalizes raw user input into a holding.
    pub fn parse(ticker: &str, shares: Decimal) -> Result<Self, CoreError> {
        Self::new(Ticker::new(ticker)?, shares)
    }
}

/// An ordered collection of holdings with unique tickers.
///
/// Insertion order is preserved for display but carries no meaning for valuation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Holding>", into = "Vec<Holding>")]
pub struct Portfolio {
    holdings: Vec<Holding>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a portfolio from a list of holdings, rejecting duplicate tickers.
    pub fn from_holdings(holdings: Vec<Holding>) -> Result<Self, CoreError> {
        let mut portfolio = Self::new();
        for holding in holdings {
            portfolio.add(holding)?;
        }
        Ok(portfolio)
    }

    pub fn add(&mut self, holding: Holding) -> Result<(), CoreError> {
        // Public fields and serde both bypass `Holding::new`.
        let holding = Holding::new(holding.ticker, holding.shares)?;
        if self.contains(&holding.ticker) {
            return Err(CoreError::DuplicateTicker(holding.ticker.to_string()));
        }
        self.holdings.push(holding);
        Ok(())
    }

    pub fn remove(&mut self, ticker: &Ticker) -> Result<Holding, CoreError> {
        let index = self
            .holdings
            .iter()
            .position(|h| &h.ticker == ticker)
            .ok_or_else(|| CoreError::HoldingNotFound(ticker.to_string()))?;
        Ok(self.holdings.remove(index))
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.holdings.iter().any(|h| &h.ticker == ticker)
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&Holding> {
        self.holdings.iter().find(|h| &h.ticker == ticker)
    }

    pub fn tickers(&self) -> Vec<Ticker> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.iter()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

impl TryFrom<Vec<Holding>> for Portfolio {
    type Error = CoreError;

    fn try_from(holdings: Vec<Holding>) -> Result<Self, Self::Error> {
        Self::from_holdings(holdings)
    }
}

impl From<Portfolio> for Vec<Holding> {
    fn from(portfolio: Portfolio) -> Self {
        portfolio.holdings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn ticker_is_trimmed_and_uppercased() {
        let ticker = Ticker::new("  brk-b ").unwrap();
        assert_eq!(ticker.as_str(), "BRK-B");
        assert_eq!(Ticker::new("^gspc").unwrap().as_str(), "^GSPC");
    }

    #[test]
    fn ticker_rejects_empty_and_garbage() {
        assert!(matches!(Ticker::new("   "), Err(CoreError::InvalidTicker(_))));
        assert!(matches!(Ticker::new("AA PL"), Err(CoreError::InvalidTicker(_))));
        assert!(matches!(Ticker::new("AAPL,MSFT"), Err(CoreError::InvalidTicker(_))));
    }

    #[test]
    fn holding_requires_positive_shares() {
        assert!(Holding::parse("AAPL", dec!(0.01)).is_ok());
        let err = Holding::parse("AAPL", Decimal::ZERO).unwrap_err();
        assert!(matches!(err, CoreError::NonPositiveShares { .. }));
        assert!(Holding::parse("AAPL", dec!(-3)).is_err());
    }

    #[test]
    fn portfolio_rejects_duplicate_tickers_case_insensitively() {
        let mut portfolio = Portfolio::new();
        portfolio.add(Holding::parse("aapl", dec!(10)).unwrap()).unwrap();

        let err = portfolio
            .add(Holding::parse("AAPL", dec!(2)).unwrap())
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateTicker("AAPL".to_string()));
        assert_eq!(portfolio.len(), 1);
    }

    #[test]
    fn portfolio_remove_preserves_order_of_the_rest() {
        let mut portfolio = Portfolio::from_holdings(vec![
            Holding::parse("AAPL", dec!(10)).unwrap(),
            Holding::parse("MSFT", dec!(5)).unwrap(),
            Holding::parse("NVDA", dec!(1)).unwrap(),
        ])
        .unwrap();

        let removed = portfolio.remove(&Ticker::new("msft").unwrap()).unwrap();
        assert_eq!(removed.shares, dec!(5));
        let remaining: Vec<String> = portfolio.tickers().into_iter().map(String::from).collect();
        assert_eq!(remaining, vec!["AAPL", "NVDA"]);

        assert!(matches!(
            portfolio.remove(&Ticker::new("MSFT").unwrap()),
            Err(CoreError::HoldingNotFound(_))
        ));
    }
}
