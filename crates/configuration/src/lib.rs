use crate::error::ConfigError;
use crate::settings::DEFAULT_LOOKBACK_DAYS;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    LoggingSettings, MAX_LOOKBACK_DAYS, MIN_LOOKBACK_DAYS, MarketDataSettings, OutputFormat,
    OutputSettings, PortfolioSettings, Settings, ValuationSettings, validate_lookback_days,
};

/// Loads the application configuration.
///
/// Sources are layered in this order, later ones winning:
/// built-in defaults, the TOML file (`path`, or an optional `config.toml` in the
/// working directory), then `TRACKER__*` environment variables such as
/// `TRACKER__VALUATION__LOOKBACK_DAYS=90`.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let builder = config::Config::builder()
        .set_default("portfolio.path", "portfolio.csv")?
        .set_default("market_data.prices_dir", "data/prices")?
        .set_default("valuation.lookback_days", i64::from(DEFAULT_LOOKBACK_DAYS))?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("TRACKER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
