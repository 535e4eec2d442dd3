use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::domain::pricing::PriceTable;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read price table {path}: {source}")]
    PriceTableIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse price table {path}: {source}")]
    PriceTableParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid price table: {0}")]
    InvalidPriceTable(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` runs the service on the in-memory repository.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub price_table: PriceTable,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidVar {
                    name: "PORT",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        let workers = match lookup("WORKERS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "WORKERS",
                        value: raw,
                        reason: "must be a positive integer".to_string(),
                    })
                }
            },
            None => None,
        };

        let price_table = match lookup("PRICE_TABLE") {
            Some(path) => load_price_table(Path::new(&path))?,
            None => PriceTable::default(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            workers,
            price_table,
        })
    }
}

/// Reads a JSON object of `{"product": unit_price}`.
pub fn load_price_table(path: &Path) -> Result<PriceTable, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PriceTableIo {
        path: path.to_path_buf(),
        source,
    })?;
    let prices: HashMap<String, BigDecimal> =
        serde_json::from_str(&raw).map_err(|source| ConfigError::PriceTableParse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_price_table(PriceTable::new(prices))
}

pub fn validate_price_table(table: PriceTable) -> Result<PriceTable, ConfigError> {
    if table.is_empty() {
        return Err(ConfigError::InvalidPriceTable(
            "at least one product is required".to_string(),
        ));
    }
    let invalid = table.invalid_entries();
    if !invalid.is_empty() {
        return Err(ConfigError::InvalidPriceTable(format!(
            "blank names, negative prices or more than two decimal places: {}",
            invalid.join(", ")
        )));
    }
    Ok(table)
}
