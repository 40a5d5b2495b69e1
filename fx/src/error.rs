//! FX error types.

use fxwallet_common::Currency;
use thiserror::Error;

/// Errors that can occur while fetching, caching or applying exchange rates.
#[derive(Debug, Error)]
pub enum FxError {
    /// No rate is known for the currency in the current snapshot.
    #[error("Rate not available for {0}")]
    RateUnavailable(Currency),

    /// The rate source could not be reached or its answer could not be decoded.
    #[error("Rate fetch failed from {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// Conversion result does not fit in a decimal.
    #[error("Conversion of {amount} from {from} to {to} overflowed")]
    Overflow {
        amount: rust_decimal::Decimal,
        from: Currency,
        to: Currency,
    },

    /// The poller was stopped and cannot be restarted.
    #[error("Rate poller has been stopped")]
    PollerStopped,
}

impl FxError {
    /// Create a fetch error for the named source.
    pub fn fetch(source_name: impl Into<String>, message: impl ToString) -> Self {
        FxError::Fetch {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error only means "cannot preview yet".
    pub fn is_rate_unavailable(&self) -> bool {
        matches!(self, FxError::RateUnavailable(_))
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
