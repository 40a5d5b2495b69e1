//! Cross-rate conversion through a snapshot's base currency.

use fxwallet_common::Currency;
use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};

/// Convert `amount` from one currency to another, routing through `base`.
///
/// `rate` looks up the rate of a currency relative to `base`. The base currency
/// itself never needs a rate. Any other currency without a rate fails with
/// [`FxError::RateUnavailable`]; an unknown rate is never treated as 1.
pub fn cross_convert<F>(
    amount: Decimal,
    from: &Currency,
    to: &Currency,
    base: &Currency,
    rate: F,
) -> FxResult<Decimal>
where
    F: Fn(&Currency) -> Option<Decimal>,
{
    let overflow = || FxError::Overflow {
        amount,
        from: from.clone(),
        to: to.clone(),
    };

    let base_amount = if from == base {
        amount
    } else {
        let from_rate = rate(from).ok_or_else(|| FxError::RateUnavailable(from.clone()))?;
        if from == to {
            return Ok(amount);
        }
        amount.checked_div(from_rate).ok_or_else(overflow)?
    };

    if to == base {
        return Ok(base_amount);
    }

    let to_rate = rate(to).ok_or_else(|| FxError::RateUnavailable(to.clone()))?;
    base_amount.checked_mul(to_rate).ok_or_else(overflow)
}
