//! Accumulated set of currencies seen from the rate source.

use std::collections::BTreeSet;

use fxwallet_common::Currency;
use parking_lot::RwLock;

use crate::snapshot::RateSnapshot;

/// Every currency code seen in any snapshot so far.
///
/// Codes are only ever added. [`CurrencyCatalog::available`] exposes the
/// subset that is on the well-known allow-list.
#[derive(Debug, Default)]
pub struct CurrencyCatalog {
    seen: RwLock<BTreeSet<Currency>>,
}

impl CurrencyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the base and rated currencies of `snapshot`.
    ///
    /// Returns how many codes were new.
    pub fn merge(&self, snapshot: &RateSnapshot) -> usize {
        let mut seen = self.seen.write();
        let before = seen.len();
        seen.insert(snapshot.base().clone());
        seen.extend(snapshot.currencies().cloned());
        seen.len() - before
    }

    /// Sorted allow-listed currencies offered to the user.
    pub fn available(&self) -> Vec<Currency> {
        self.seen
            .read()
            .iter()
            .filter(|c| c.is_well_known())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(codes: &[&str]) -> RateSnapshot {
        RateSnapshot::new(
            Currency::eur(),
            codes.iter().map(|c| (Currency::new(*c), dec!(1.5))),
        )
    }

    #[test]
    fn test_available_is_allow_listed_and_sorted() {
        let catalog = CurrencyCatalog::new();
        catalog.merge(&snapshot(&["USD", "BTC", "AED", "JPY"]));

        assert_eq!(
            catalog.available(),
            vec![Currency::eur(), Currency::jpy(), Currency::usd()]
        );
        assert!(!catalog.available().contains(&Currency::new("BTC")));
    }

    #[test]
    fn test_merge_accumulates_without_duplicates() {
        let catalog = CurrencyCatalog::new();

        assert_eq!(catalog.merge(&snapshot(&["USD"])), 2);
        assert_eq!(catalog.merge(&snapshot(&["USD", "GBP"])), 1);
        assert_eq!(catalog.merge(&snapshot(&["USD"])), 0);

        // GBP stays even though the last snapshot dropped it.
        assert_eq!(
            catalog.available(),
            vec![Currency::eur(), Currency::gbp(), Currency::usd()]
        );
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = CurrencyCatalog::new();
        assert!(catalog.available().is_empty());
    }
}
