//! Ledger error types.

use fxwallet_common::Currency;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Debit exceeds the balance held, or no balance is held at all.
    #[error("Insufficient funds in {currency}: required {required}, available {available}")]
    InsufficientFunds {
        currency: Currency,
        required: Decimal,
        available: Decimal,
    },

    /// Amounts moved through the ledger must not be negative.
    #[error("Invalid amount {amount} for {currency}")]
    InvalidAmount { currency: Currency, amount: Decimal },

    /// A balance would leave the representable range.
    #[error("Balance overflow in {currency}")]
    Overflow { currency: Currency },
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
