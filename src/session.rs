use anyhow::{Context, bail};
use chrono::NaiveDate;
use configuration::Settings;
use core_types::{Holding, Portfolio, Ticker};
use market_data::PriceProvider;
use portfolio_store::PortfolioRepository;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::info;
use valuation::{ValuationEngine, ValuationResult, normalize_prices};

/// Glue between the persisted portfolio, the price source and the valuation engine.
///
/// The session holds no portfolio state of its own: every operation reloads the
/// saved holdings, and every valuation is recomputed from scratch.
pub struct Session<P: PriceProvider> {
    settings: Settings,
    repository: PortfolioRepository,
    provider: P,
    engine: ValuationEngine,
}

impl<P: PriceProvider> Session<P> {
    pub fn new(settings: Settings, provider: P) -> Self {
        let repository = PortfolioRepository::new(&settings.portfolio.path);
        Self {
            settings,
            repository,
            provider,
            engine: ValuationEngine::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn portfolio(&self) -> anyhow::Result<Portfolio> {
        self.repository
            .load()
            .with_context(|| format!("Failed to load {}", self.repository.path().display()))
    }

    /// Adds a holding and saves the portfolio.
    ///
    /// Unless `force` is set, the ticker must have some price history with the provider.
    pub async fn add_holding(
        &self,
        ticker: &str,
        shares: Decimal,
        force: bool,
    ) -> anyhow::Result<Holding> {
        let holding = Holding::parse(ticker, shares)?;
        let mut portfolio = self.portfolio()?;
        if portfolio.contains(&holding.ticker) {
            bail!("{} is already in your portfolio.", holding.ticker);
        }

        if !force && !self.provider.has_history(&holding.ticker).await? {
            bail!("Could not find data for {}.", holding.ticker);
        }

        portfolio.add(holding.clone())?;
        self.repository.save(&portfolio)?;
        info!(ticker = %holding.ticker, shares = %holding.shares, "Added holding");
        Ok(holding)
    }

    pub fn remove_holding(&self, ticker: &str) -> anyhow::Result<Holding> {
        let ticker = Ticker::new(ticker)?;
        let mut portfolio = self.portfolio()?;
        let removed = portfolio.remove(&ticker)?;
        self.repository.save(&portfolio)?;
        info!(%ticker, "Removed holding");
        Ok(removed)
    }

    /// Replaces the saved portfolio with a validated CSV upload.
    pub fn load_from(&self, source: &Path) -> anyhow::Result<Portfolio> {
        self.repository
            .import_from(source)
            .with_context(|| format!("Error loading {}", source.display()))
    }

    /// Writes the saved portfolio to `destination` as CSV.
    pub fn save_to(&self, destination: &Path) -> anyhow::Result<usize> {
        self.repository
            .export_to(destination)
            .with_context(|| format!("Error saving to {}", destination.display()))
    }

    /// Values the saved portfolio over the `days` (or configured) calendar days before `today`.
    ///
    /// Returns `Ok(None)` when there is nothing to value yet.
    pub async fn value(
        &self,
        days: Option<u32>,
        today: NaiveDate,
    ) -> anyhow::Result<Option<ValuationResult>> {
        let portfolio = self.portfolio()?;
        if portfolio.is_empty() {
            return Ok(None);
        }

        let window = self.settings.lookback_window(days, today)?;
        let tickers = portfolio.tickers();

        let raw = self
            .provider
            .fetch_closes(&tickers, &window)
            .await
            .context("Failed to fetch market data")?;
        // Providers are not required to honour the window exactly.
        let prices = normalize_prices(raw, &tickers)?.within(&window);

        let result = self.engine.calculate(&portfolio, &prices)?;
        info!(
            holdings = portfolio.len(),
            dates = result.values.len(),
            current_total = %result.current_total,
            "Valued portfolio"
        );
        Ok(Some(result))
    }
}
