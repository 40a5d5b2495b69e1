//! HTTP rate source for JSON currency-exchange-rate endpoints.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use fxwallet_common::Currency;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{FxError, FxResult};
use crate::provider::RateSource;
use crate::snapshot::RateSnapshot;

/// Default endpoint serving `{ base, date, rates }`.
pub const DEFAULT_RATES_URL: &str =
    "https://developers.paysera.com/tasks/api/currency-exchange-rates";

/// Configuration for [`HttpRateSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Endpoint URL.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RATES_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Wire format of the rates endpoint.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    base: String,
    #[serde(default)]
    date: Option<String>,
    rates: HashMap<String, f64>,
}

impl RatesResponse {
    fn into_snapshot(self, source_name: &str) -> FxResult<RateSnapshot> {
        let base = Currency::parse(&self.base).map_err(|e| FxError::fetch(source_name, e))?;

        let rates = self.rates.into_iter().filter_map(|(code, value)| {
            let currency = match Currency::parse(&code) {
                Ok(currency) => currency,
                Err(e) => {
                    warn!(source = source_name, error = %e, "Skipping rate with bad code");
                    return None;
                }
            };
            match Decimal::from_f64(value).filter(|_| value.is_finite()) {
                Some(rate) => Some((currency, rate)),
                None => {
                    warn!(source = source_name, currency = %currency, value, "Skipping unrepresentable rate");
                    None
                }
            }
        });

        let snapshot = RateSnapshot::new(base, rates);
        Ok(match self.date {
            Some(date) => snapshot.with_date(date),
            None => snapshot,
        })
    }
}

/// Decode a rates endpoint body into a snapshot.
pub fn parse_rates(body: &str, source_name: &str) -> FxResult<RateSnapshot> {
    let response: RatesResponse =
        serde_json::from_str(body).map_err(|e| FxError::fetch(source_name, e))?;
    response.into_snapshot(source_name)
}

/// Rate source backed by an HTTP GET returning JSON.
pub struct HttpRateSource {
    client: reqwest::Client,
    config: HttpSourceConfig,
}

impl HttpRateSource {
    /// Create a new HTTP source.
    pub fn new(config: HttpSourceConfig) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FxError::fetch("http", e))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(url = %self.config.url))]
    async fn fetch(&self) -> FxResult<RateSnapshot> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| FxError::fetch(self.name(), e))?;

        let status = response.status();
        debug!(status = %status, "Received rates response");
        if !status.is_success() {
            return Err(FxError::fetch(self.name(), format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FxError::fetch(self.name(), e))?;

        parse_rates(&body, self.name())
    }
}
