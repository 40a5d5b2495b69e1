//! Journal entries recording every balance change.

use chrono::{DateTime, Utc};
use fxwallet_common::{Currency, ExchangeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Funds leaving a balance.
    Debit,
    /// Commission charged on top of a debit.
    Commission,
    /// Funds arriving in a balance.
    Credit,
}

/// A single journal entry in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Exchange this entry belongs to, if any.
    pub exchange_id: Option<ExchangeId>,
    /// Entry type.
    pub entry_type: EntryType,
    /// Amount (always non-negative).
    pub amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// Balance after this entry.
    pub balance_after: Decimal,
    /// When this entry was created.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    fn new(
        exchange_id: Option<ExchangeId>,
        entry_type: EntryType,
        currency: Currency,
        amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            exchange_id,
            entry_type,
            amount,
            currency,
            balance_after: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Create a debit entry.
    pub fn debit(exchange_id: Option<ExchangeId>, currency: Currency, amount: Decimal) -> Self {
        Self::new(exchange_id, EntryType::Debit, currency, amount)
    }

    /// Create a commission entry.
    pub fn commission(exchange_id: Option<ExchangeId>, currency: Currency, amount: Decimal) -> Self {
        Self::new(exchange_id, EntryType::Commission, currency, amount)
    }

    /// Create a credit entry.
    pub fn credit(exchange_id: Option<ExchangeId>, currency: Currency, amount: Decimal) -> Self {
        Self::new(exchange_id, EntryType::Credit, currency, amount)
    }

    /// Change this entry makes to its balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit | EntryType::Commission => -self.amount,
            EntryType::Credit => self.amount,
        }
    }
}

/// A batch of journal entries that must be committed together.
#[derive(Debug, Clone, Default)]
pub struct JournalBatch {
    /// Entries in the batch.
    pub entries: Vec<JournalEntry>,
}

impl JournalBatch {
    /// Create a new batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the batch.
    pub fn add_entry(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// Total outgoing amount (debits and commission) in `currency`.
    ///
    /// `None` if the total does not fit in a `Decimal`.
    pub fn total_outgoing(&self, currency: &Currency) -> Option<Decimal> {
        self.entries
            .iter()
            .filter(|e| &e.currency == currency && e.entry_type != EntryType::Credit)
            .try_fold(Decimal::ZERO, |total, e| total.checked_add(e.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn exchange_batch() -> JournalBatch {
        let exchange_id = Some(ExchangeId::new());
        let mut batch = JournalBatch::new();
        batch.add_entry(JournalEntry::debit(exchange_id, Currency::eur(), dec!(100)));
        batch.add_entry(JournalEntry::commission(exchange_id, Currency::eur(), dec!(0.7)));
        batch.add_entry(JournalEntry::credit(exchange_id, Currency::usd(), dec!(108)));
        batch
    }

    #[test]
    fn test_total_outgoing() {
        let batch = exchange_batch();

        assert_eq!(batch.total_outgoing(&Currency::eur()), Some(dec!(100.7)));
        assert_eq!(batch.total_outgoing(&Currency::usd()), Some(Decimal::ZERO));
    }

    #[test]
    fn test_total_outgoing_overflow() {
        let mut batch = JournalBatch::new();
        batch.add_entry(JournalEntry::debit(None, Currency::eur(), Decimal::MAX));
        batch.add_entry(JournalEntry::commission(None, Currency::eur(), dec!(1)));

        assert_eq!(batch.total_outgoing(&Currency::eur()), None);
    }

    #[test]
    fn test_signed_amount() {
        let debit = JournalEntry::debit(None, Currency::eur(), dec!(5));
        let credit = JournalEntry::credit(None, Currency::eur(), dec!(5));
        assert_eq!(debit.signed_amount(), dec!(-5));
        assert_eq!(credit.signed_amount(), dec!(5));
    }
}
