//! Exchange error types.

use fxwallet_common::Currency;
use fxwallet_fx::FxError;
use fxwallet_ledger::LedgerError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned to callers of the exchange engine and session.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Balance update rejected by the ledger.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Rates missing for a preview or conversion.
    #[error(transparent)]
    Fx(#[from] FxError),

    /// Amounts must not be negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Selling and receiving the same currency.
    #[error("Cannot exchange {0} for itself")]
    SameCurrency(Currency),

    /// The session has been closed.
    #[error("Session is closed")]
    SessionClosed,
}

impl ExchangeError {
    /// Whether the sell balance could not cover the debit.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(
            self,
            ExchangeError::Ledger(LedgerError::InsufficientFunds { .. })
        )
    }

    /// Whether a needed rate is not known yet.
    pub fn is_rate_unavailable(&self) -> bool {
        matches!(self, ExchangeError::Fx(e) if e.is_rate_unavailable())
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ExchangeError::Ledger(LedgerError::InsufficientFunds { .. }) => "INSUFFICIENT_FUNDS",
            ExchangeError::Ledger(LedgerError::InvalidAmount { .. }) => "INVALID_AMOUNT",
            ExchangeError::Ledger(LedgerError::Overflow { .. }) => "BALANCE_OVERFLOW",
            ExchangeError::Fx(FxError::RateUnavailable(_)) => "RATE_UNAVAILABLE",
            ExchangeError::Fx(FxError::Overflow { .. }) => "CONVERSION_OVERFLOW",
            ExchangeError::Fx(FxError::Fetch { .. }) => "FETCH_FAILED",
            ExchangeError::Fx(FxError::PollerStopped) => "POLLER_STOPPED",
            ExchangeError::InvalidAmount(_) => "INVALID_AMOUNT",
            ExchangeError::SameCurrency(_) => "SAME_CURRENCY",
            ExchangeError::SessionClosed => "SESSION_CLOSED",
        }
    }
}

/// Result type alias for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;
