use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use enricher_engine::{StockSource, DEFAULT_PRICE_SELECTOR};

use super::logging::LogDestination;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub catalog_path: PathBuf,
    pub output_path: PathBuf,
    pub locale: String,
    pub stock_source: Option<StockSource>,
    pub workers: usize,
    pub page_timeout: Duration,
    pub price_selector: String,
    pub user_agent: String,
    pub log_destination: LogDestination,
}

/// Read configuration from the process environment.
///
/// `.env` files must already be loaded by the caller.
pub fn load_config() -> Result<Config, ConfigError> {
    build_config(|key| std::env::var(key))
}

pub(crate) fn build_config<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };
    let parse_positive = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let workers = usize::try_from(parse_positive("ENRICHER_WORKERS", "4")?)
        .map_err(|e| invalid("ENRICHER_WORKERS", e.to_string()))?;
    let page_timeout = Duration::from_secs(parse_positive("ENRICHER_PAGE_TIMEOUT_SECS", "8")?);

    let stock_source = match (
        optional("ENRICHER_STOCK_FEED_URL"),
        optional("ENRICHER_STOCK_FEED_PATH"),
    ) {
        (Some(url), _) => Some(StockSource::Remote(url)),
        (None, Some(path)) => Some(StockSource::Local(PathBuf::from(path))),
        (None, None) => None,
    };

    let log = or_default("ENRICHER_LOG", "terminal");
    let log_destination = log
        .parse::<LogDestination>()
        .map_err(|reason| invalid("ENRICHER_LOG", reason))?;

    Ok(Config {
        catalog_path: PathBuf::from(or_default(
            "ENRICHER_CATALOG_PATH",
            "files/catalog-products.csv",
        )),
        output_path: PathBuf::from(or_default(
            "ENRICHER_OUTPUT_PATH",
            "output/productos_filtrados.csv",
        )),
        locale: or_default("ENRICHER_LOCALE", "es_ES"),
        stock_source,
        workers,
        page_timeout,
        price_selector: or_default("ENRICHER_PRICE_SELECTOR", DEFAULT_PRICE_SELECTOR),
        user_agent: or_default(
            "ENRICHER_USER_AGENT",
            concat!("catalog-enricher/", env!("CARGO_PKG_VERSION")),
        ),
        log_destination,
    })
}
