use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("invalid value for {key}: {reason}")]
pub struct ConfigError {
    key: &'static str,
    reason: String,
}

/// How a multi-step item write is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Every row is committed on its own; a failure leaves earlier rows in place.
    #[default]
    PerStatement,
    /// The whole create/update is one transaction.
    Atomic,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub redis_url: Option<String>,
    pub transactions: TransactionMode,
    pub pool_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let strict: bool = load(&lookup, "STRICT_TRANSACTIONS", "false")?;
        Ok(Self {
            database_url: load(&lookup, "DATABASE_URL", "food_catalog.db")?,
            host: load(&lookup, "BIND_HOST", "127.0.0.1")?,
            port: load(&lookup, "PORT", "8080")?,
            upload_dir: PathBuf::from(load::<String, _>(&lookup, "UPLOAD_DIR", "uploads")?),
            redis_url: lookup("REDIS_URL").filter(|url| !url.is_empty()),
            transactions: if strict {
                TransactionMode::Atomic
            } else {
                TransactionMode::PerStatement
            },
            pool_size: load(&lookup, "DB_POOL_SIZE", "8")?,
        })
    }
}

fn load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| ConfigError {
        key,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, "food_catalog.db");
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.redis_url, None);
        assert_eq!(config.transactions, TransactionMode::PerStatement);
    }

    #[test]
    fn strict_transactions_flag_selects_atomic_mode() {
        let config = config(&[("STRICT_TRANSACTIONS", "true"), ("REDIS_URL", "redis://cache:6379")]).unwrap();
        assert_eq!(config.transactions, TransactionMode::Atomic);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().starts_with("invalid value for PORT"));
        assert!(config(&[("STRICT_TRANSACTIONS", "maybe")]).is_err());
    }
}
