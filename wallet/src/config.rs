//! Wallet configuration.

use std::time::Duration;

use fxwallet_common::Currency;
use fxwallet_fx::{HttpSourceConfig, PollerConfig};
use rust_decimal::Decimal;

use crate::commission::CommissionPolicy;

/// Main wallet configuration.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Rate polling configuration.
    pub poller: PollerConfig,
    /// HTTP rate source configuration.
    pub http: HttpSourceConfig,
    /// Commission tiers.
    pub commission: CommissionPolicy,
    /// Currency of the opening balance.
    pub seed_currency: Currency,
    /// Opening balance amount.
    pub seed_amount: Decimal,
    /// Log level.
    pub log_level: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            http: HttpSourceConfig::default(),
            commission: CommissionPolicy::default(),
            seed_currency: Currency::eur(),
            seed_amount: Decimal::new(1000, 0),
            log_level: "info".to_string(),
        }
    }
}

impl WalletConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Values that fail to parse are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("FXWALLET_RATES_URL") {
            config.http.url = url;
        }

        if let Some(ms) = lookup("FXWALLET_POLL_INTERVAL_MS") {
            if let Ok(ms) = ms.parse() {
                config.poller.interval = Duration::from_millis(ms);
            }
        }

        if let Some(ms) = lookup("FXWALLET_FETCH_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.http.timeout = Duration::from_millis(ms);
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.poller.interval.is_zero() {
            return Err("Poll interval cannot be 0".to_string());
        }

        if self.http.url.is_empty() {
            return Err("Rates URL cannot be empty".to_string());
        }

        if self.seed_amount < Decimal::ZERO {
            return Err("Seed amount cannot be negative".to_string());
        }

        self.commission.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = WalletConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seed_currency, Currency::eur());
        assert_eq!(config.seed_amount, dec!(1000));
        assert_eq!(config.poller.interval, Duration::from_secs(5));
        assert_eq!(config.http.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup() {
        let config = WalletConfig::from_lookup(lookup_from(&[
            ("FXWALLET_RATES_URL", "http://localhost:8080/rates"),
            ("FXWALLET_POLL_INTERVAL_MS", "250"),
            ("FXWALLET_FETCH_TIMEOUT_MS", "1500"),
            ("LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.http.url, "http://localhost:8080/rates");
        assert_eq!(config.poller.interval, Duration::from_millis(250));
        assert_eq!(config.http.timeout, Duration::from_millis(1500));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let config = WalletConfig::from_lookup(lookup_from(&[
            ("FXWALLET_POLL_INTERVAL_MS", "soon"),
            ("FXWALLET_FETCH_TIMEOUT_MS", "-3"),
        ]));

        assert_eq!(config.poller.interval, Duration::from_secs(5));
        assert_eq!(config.http.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = WalletConfig::default();
        config.poller.interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.http.url.clear();
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.seed_amount = dec!(-1);
        assert!(config.validate().is_err());

        let mut config = WalletConfig::default();
        config.commission.rate = dec!(1);
        assert!(config.validate().is_err());
    }
}
