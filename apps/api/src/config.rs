//! API configuration module.
//!
//! Configuration is loaded from `PROMOWEB_*` environment variables with
//! fallback to defaults.
//!
//! | Variable                               | Default              |
//! |----------------------------------------|----------------------|
//! | `PROMOWEB_HOST`                        | `0.0.0.0`            |
//! | `PROMOWEB_PORT`                        | `8000`               |
//! | `PROMOWEB_DATABASE_PATH`               | `./data/promoweb.db` |
//! | `PROMOWEB_DB_MAX_CONNECTIONS`          | `5`                  |
//! | `PROMOWEB_LOG_LEVEL`                   | `info`               |
//! | `PROMOWEB_DEPOSIT_PERCENTAGE`          | `30`                 |
//! | `PROMOWEB_SHIPPING_BASE_RATE_XAF`      | `2000`               |
//! | `PROMOWEB_SHIPPING_PER_KG_RATE_XAF`    | `500`                |
//! | `PROMOWEB_FREE_SHIPPING_THRESHOLD_XAF` | unset                |
//! | `PROMOWEB_GATEWAY_DELAY_MS`            | `2000`               |
//! | `PROMOWEB_MOBILE_MONEY_SUCCESS_RATE`   | `0.9`                |
//! | `PROMOWEB_CARD_SUCCESS_RATE`           | `0.95`               |
//! | `PROMOWEB_WAREHOUSE_STREET`            | `Zone Industrielle Bassa` |
//! | `PROMOWEB_WAREHOUSE_CITY`              | `Douala`             |
//! | `PROMOWEB_WAREHOUSE_REGION`            | `Littoral`           |

use promoweb_core::{Address, Money, ShippingRate, DEFAULT_DEPOSIT_PERCENTAGE};
use promoweb_db::DbConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind host
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,

    /// Deposit percentage applied when checkout does not send one
    pub default_deposit_percentage: i64,

    /// Rates used when the shipping region has no active zone
    pub default_base_rate_xaf: i64,
    pub default_per_kg_rate_xaf: i64,
    pub free_shipping_threshold_xaf: Option<i64>,

    /// Simulated gateway round trip
    pub gateway_delay_ms: u64,

    /// Probability that the simulated gateway approves a payment
    pub mobile_money_success_rate: f64,
    pub card_success_rate: f64,

    /// Origin address of every shipment unless the request overrides it
    pub warehouse_address: Address,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_path: "./data/promoweb.db".to_string(),
            db_max_connections: 5,
            log_level: "info".to_string(),
            default_deposit_percentage: DEFAULT_DEPOSIT_PERCENTAGE,
            default_base_rate_xaf: 2_000,
            default_per_kg_rate_xaf: 500,
            free_shipping_threshold_xaf: None,
            gateway_delay_ms: 2_000,
            mobile_money_success_rate: 0.9,
            card_success_rate: 0.95,
            warehouse_address: Address {
                street_address: "Zone Industrielle Bassa".to_string(),
                city: "Douala".to_string(),
                region: Some("Littoral".to_string()),
                postal_code: None,
                country: "CM".to_string(),
            },
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (environment, test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            host: lookup("PROMOWEB_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PROMOWEB_PORT", defaults.port)?,
            database_path: lookup("PROMOWEB_DATABASE_PATH").unwrap_or(defaults.database_path),
            db_max_connections: parse(
                &lookup,
                "PROMOWEB_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,
            log_level: lookup("PROMOWEB_LOG_LEVEL").unwrap_or(defaults.log_level),
            default_deposit_percentage: parse(
                &lookup,
                "PROMOWEB_DEPOSIT_PERCENTAGE",
                defaults.default_deposit_percentage,
            )?,
            default_base_rate_xaf: parse(
                &lookup,
                "PROMOWEB_SHIPPING_BASE_RATE_XAF",
                defaults.default_base_rate_xaf,
            )?,
            default_per_kg_rate_xaf: parse(
                &lookup,
                "PROMOWEB_SHIPPING_PER_KG_RATE_XAF",
                defaults.default_per_kg_rate_xaf,
            )?,
            free_shipping_threshold_xaf: match lookup("PROMOWEB_FREE_SHIPPING_THRESHOLD_XAF") {
                Some(raw) => Some(raw.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue("PROMOWEB_FREE_SHIPPING_THRESHOLD_XAF".to_string())
                })?),
                None => None,
            },
            gateway_delay_ms: parse(&lookup, "PROMOWEB_GATEWAY_DELAY_MS", defaults.gateway_delay_ms)?,
            mobile_money_success_rate: parse(
                &lookup,
                "PROMOWEB_MOBILE_MONEY_SUCCESS_RATE",
                defaults.mobile_money_success_rate,
            )?,
            card_success_rate: parse(
                &lookup,
                "PROMOWEB_CARD_SUCCESS_RATE",
                defaults.card_success_rate,
            )?,
            warehouse_address: Address {
                street_address: lookup("PROMOWEB_WAREHOUSE_STREET")
                    .unwrap_or(defaults.warehouse_address.street_address),
                city: lookup("PROMOWEB_WAREHOUSE_CITY").unwrap_or(defaults.warehouse_address.city),
                region: lookup("PROMOWEB_WAREHOUSE_REGION").or(defaults.warehouse_address.region),
                postal_code: None,
                country: defaults.warehouse_address.country,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.default_deposit_percentage) {
            return Err(ConfigError::InvalidValue(
                "PROMOWEB_DEPOSIT_PERCENTAGE".to_string(),
            ));
        }
        if self.default_base_rate_xaf < 0 || self.default_per_kg_rate_xaf < 0 {
            return Err(ConfigError::InvalidValue(
                "PROMOWEB_SHIPPING_*_RATE_XAF".to_string(),
            ));
        }
        for (key, rate) in [
            ("PROMOWEB_MOBILE_MONEY_SUCCESS_RATE", self.mobile_money_success_rate),
            ("PROMOWEB_CARD_SUCCESS_RATE", self.card_success_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::InvalidValue(key.to_string()));
            }
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "PROMOWEB_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Rates for a region without an active zone.
    pub fn default_shipping_rate(&self) -> ShippingRate {
        ShippingRate {
            base_rate: Money::from_xaf(self.default_base_rate_xaf),
            per_kg_rate: Money::from_xaf(self.default_per_kg_rate_xaf),
            free_shipping_threshold: self.free_shipping_threshold_xaf.map(Money::from_xaf),
            max_weight_grams: None,
        }
    }

    pub fn gateway_delay(&self) -> Duration {
        Duration::from_millis(self.gateway_delay_ms)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.default_deposit_percentage, 30);
        assert_eq!(config.default_shipping_rate().base_rate.xaf(), 2_000);
        assert_eq!(config.gateway_delay(), Duration::from_secs(2));
        assert_eq!(config.warehouse_address.city, "Douala");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PROMOWEB_PORT", "9000"),
            ("PROMOWEB_DEPOSIT_PERCENTAGE", "50"),
            ("PROMOWEB_FREE_SHIPPING_THRESHOLD_XAF", "150000"),
            ("PROMOWEB_GATEWAY_DELAY_MS", "0"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.default_deposit_percentage, 50);
        assert_eq!(
            config.default_shipping_rate().free_shipping_threshold,
            Some(Money::from_xaf(150_000))
        );
        assert!(config.gateway_delay().is_zero());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("PROMOWEB_PORT", "eighty")]).is_err());
        assert!(load(&[("PROMOWEB_DEPOSIT_PERCENTAGE", "0")]).is_err());
        assert!(load(&[("PROMOWEB_CARD_SUCCESS_RATE", "1.5")]).is_err());
    }
}
