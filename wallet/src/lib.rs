//! fxwallet
//!
//! A single-user multi-currency wallet. Balances live in an in-memory ledger,
//! exchange rates are refreshed in the background, and exchanges are charged
//! a commission once the free allowance is used up.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxwallet::{WalletConfig, WalletSession};
//! use fxwallet_fx::HttpRateSource;
//!
//! let config = WalletConfig::from_env();
//! let source = Arc::new(HttpRateSource::new(config.http.clone())?);
//! let session = WalletSession::new(&config, source)?;
//! session.start()?;
//! session.wait_for_rates(Duration::from_secs(10)).await;
//!
//! session.set_sell_amount_text("100");
//! session.submit()?;
//! println!("{}", session.take_message().unwrap_or_default());
//! session.stop().await;
//! ```

pub mod commission;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod session;
pub mod state;

pub use commission::CommissionPolicy;
pub use config::WalletConfig;
pub use engine::{ExchangeEngine, ExchangeReceipt};
pub use error::{ExchangeError, ExchangeResult};
pub use metrics::{MetricsSnapshot, SharedMetrics, WalletMetrics};
pub use session::{ExchangeForm, WalletSession, INSUFFICIENT_FUNDS_MESSAGE};
pub use state::{ExchangePhase, SessionState};
