//! fxwallet FX
//!
//! Exchange rates for the wallet: where they come from, where the latest
//! table is kept, and the background task that keeps it fresh.
//!
//! # Features
//!
//! - Pluggable [`RateSource`] with an HTTP/JSON implementation
//! - Latest-wins [`RateCache`] that never blocks readers
//! - Cross-rate conversion through the snapshot's base currency
//! - Cancellable [`RatePoller`] on a fixed cadence
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxwallet_fx::{CurrencyCatalog, HttpRateSource, HttpSourceConfig, PollerConfig, RateCache, RatePoller};
//!
//! let source = Arc::new(HttpRateSource::new(HttpSourceConfig::default())?);
//! let cache = Arc::new(RateCache::new());
//! let poller = RatePoller::new(source, cache.clone(), Arc::new(CurrencyCatalog::new()), PollerConfig::default());
//! poller.start()?;
//!
//! let usd = cache.snapshot().convert(dec!(100), &Currency::eur(), &Currency::usd())?;
//! poller.stop().await;
//! ```

pub mod cache;
pub mod catalog;
pub mod conversion;
pub mod error;
pub mod http;
pub mod poller;
pub mod provider;
pub mod snapshot;

pub use cache::{CacheStats, RateCache, SharedRateCache};
pub use catalog::CurrencyCatalog;
pub use conversion::cross_convert;
pub use error::{FxError, FxResult};
pub use http::{parse_rates, HttpRateSource, HttpSourceConfig, DEFAULT_RATES_URL};
pub use poller::{PollerConfig, PollerState, PollerStatsSnapshot, RatePoller};
pub use provider::RateSource;
pub use snapshot::RateSnapshot;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::StaticRateSource;
