//! Currency balance.

use fxwallet_common::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Amount held in one currency. Never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Currency.
    pub currency: Currency,
    /// Amount held.
    pub amount: Decimal,
}

impl Balance {
    /// Create a new balance.
    pub fn new(currency: Currency, amount: Decimal) -> Self {
        Self { currency, amount }
    }

    /// Create a zero balance.
    pub fn zero(currency: Currency) -> Self {
        Self::new(currency, Decimal::ZERO)
    }

    /// Check if the balance covers `amount`.
    pub fn has_sufficient_funds(&self, amount: Decimal) -> bool {
        self.amount >= amount
    }

    /// The balance as money.
    pub fn as_money(&self) -> Money {
        Money::new(self.amount, self.currency.clone())
    }
}
