use crate::error::ConfigError;
use chrono::NaiveDate;
use core_types::LookbackWindow;
use serde::Deserialize;
use std::path::PathBuf;

/// Shortest lookback window accepted, in calendar days.
pub const MIN_LOOKBACK_DAYS: u32 = 30;
/// Longest lookback window accepted (five years), in calendar days.
pub const MAX_LOOKBACK_DAYS: u32 = 365 * 5;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub portfolio: PortfolioSettings,
    pub market_data: MarketDataSettings,
    pub valuation: ValuationSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the holdings are persisted between sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioSettings {
    /// CSV file with a `ticker,shares` header.
    pub path: PathBuf,
}

/// Where historical closes are read from.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketDataSettings {
    /// Directory holding one `<TICKER>.csv` file of `date,close` rows per instrument.
    pub prices_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationSettings {
    /// Trailing calendar days to value when no `--days` override is given.
    pub lookback_days: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How valuation results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive such as `info` or `valuation=debug`. `RUST_LOG` wins when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "portfolio-tracker.log".to_string(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.portfolio.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "portfolio.path must not be empty".to_string(),
            ));
        }
        if self.market_data.prices_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "market_data.prices_dir must not be empty".to_string(),
            ));
        }
        validate_lookback_days(self.valuation.lookback_days)?;
        Ok(())
    }

    /// Builds the window ending on `today`, using `days` when given and the configured default otherwise.
    pub fn lookback_window(
        &self,
        days: Option<u32>,
        today: NaiveDate,
    ) -> Result<LookbackWindow, ConfigError> {
        let days = validate_lookback_days(days.unwrap_or(self.valuation.lookback_days))?;
        Ok(LookbackWindow::ending_on(today, days)?)
    }
}

pub fn validate_lookback_days(days: u32) -> Result<u32, ConfigError> {
    if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&days) {
        return Err(ConfigError::ValidationError(format!(
            "lookback must be between {MIN_LOOKBACK_DAYS} and {MAX_LOOKBACK_DAYS} days, got {days}"
        )));
    }
    Ok(days)
}
