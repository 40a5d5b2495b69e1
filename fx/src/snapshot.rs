//! Rate snapshots as delivered by a rate source.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use fxwallet_common::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::conversion::cross_convert;
use crate::error::FxResult;

/// A complete table of rates relative to one base currency.
///
/// Snapshots are immutable once built and replace each other wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    base: Currency,
    rates: HashMap<Currency, Decimal>,
    date: Option<String>,
    as_of: DateTime<Utc>,
}

impl RateSnapshot {
    /// Build a snapshot, dropping any rate that is zero or negative.
    pub fn new(base: Currency, rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Self {
        let rates = rates
            .into_iter()
            .filter(|(currency, rate)| {
                if *rate > Decimal::ZERO {
                    true
                } else {
                    warn!(currency = %currency, rate = %rate, "Dropping non-positive rate");
                    false
                }
            })
            .collect();

        Self {
            base,
            rates,
            date: None,
            as_of: Utc::now(),
        }
    }

    /// A snapshot with no rates at all.
    pub fn empty(base: Currency) -> Self {
        Self::new(base, std::iter::empty())
    }

    /// Attach the provider's publication date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Base currency all rates are relative to.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// Rate of `currency` relative to the base, if known.
    pub fn rate(&self, currency: &Currency) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    /// All known rates.
    pub fn rates(&self) -> &HashMap<Currency, Decimal> {
        &self.rates
    }

    /// Currencies with a known rate.
    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.rates.keys()
    }

    /// Provider publication date, if the source sent one.
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    /// When this snapshot was built.
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    /// Time elapsed since the snapshot was built.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.as_of)
    }

    /// Number of rates in the snapshot.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Convert `amount` between two currencies using this snapshot only.
    pub fn convert(&self, amount: Decimal, from: &Currency, to: &Currency) -> FxResult<Decimal> {
        cross_convert(amount, from, to, &self.base, |c| self.rate(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_non_positive_rates_are_dropped() {
        let snapshot = RateSnapshot::new(
            Currency::eur(),
            vec![
                (Currency::usd(), dec!(1.08)),
                (Currency::gbp(), Decimal::ZERO),
                (Currency::jpy(), dec!(-1)),
            ],
        );

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.rate(&Currency::usd()), Some(dec!(1.08)));
        assert_eq!(snapshot.rate(&Currency::gbp()), None);
        assert_eq!(snapshot.rate(&Currency::jpy()), None);
    }

    #[test]
    fn test_empty_snapshot_only_converts_base() {
        let snapshot = RateSnapshot::empty(Currency::eur());

        assert!(snapshot.is_empty());
        assert_eq!(
            snapshot
                .convert(dec!(10), &Currency::eur(), &Currency::eur())
                .unwrap(),
            dec!(10)
        );
        assert!(matches!(
            snapshot.convert(dec!(10), &Currency::usd(), &Currency::eur()),
            Err(FxError::RateUnavailable(_))
        ));
    }

    #[test]
    fn test_date_is_carried() {
        let snapshot = RateSnapshot::empty(Currency::eur()).with_date("2024-01-01");
        assert_eq!(snapshot.date(), Some("2024-01-01"));
    }
}
