use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Invalid lookback window: {0}")]
    Window(#[from] CoreError),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
