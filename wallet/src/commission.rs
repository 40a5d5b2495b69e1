//! Volume-tiered commission.

use rust_decimal::Decimal;

/// Commission waived for the first `free_exchanges` exchanges, then charged
/// as `rate` times the sold amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionPolicy {
    /// Number of completed exchanges that are free of charge.
    pub free_exchanges: u64,
    /// Fraction of the sold amount charged afterwards.
    pub rate: Decimal,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            free_exchanges: 5,
            rate: Decimal::new(7, 3), // 0.7%
        }
    }
}

impl CommissionPolicy {
    /// Commission on `amount` given how many exchanges have completed before.
    pub fn commission(&self, completed_exchanges: u64, amount: Decimal) -> Decimal {
        if completed_exchanges < self.free_exchanges {
            Decimal::ZERO
        } else {
            amount * self.rate
        }
    }

    /// Validate the policy.
    pub fn validate(&self) -> Result<(), String> {
        if self.rate < Decimal::ZERO || self.rate >= Decimal::ONE {
            return Err(format!("Commission rate {} must be in [0, 1)", self.rate));
        }
        Ok(())
    }
}
