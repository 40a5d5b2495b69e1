//! Core ledger implementation.

use std::collections::HashMap;

use fxwallet_common::{Currency, ExchangeId};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::balance::Balance;
use crate::error::{LedgerError, LedgerResult};
use crate::journal::{JournalBatch, JournalEntry};

/// Both sides of an exchange, as applied to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeLegs {
    /// Exchange the journal entries are tagged with.
    pub exchange_id: ExchangeId,
    /// Currency being sold.
    pub sell_currency: Currency,
    /// Amount sold, excluding commission.
    pub sell_amount: Decimal,
    /// Commission charged in the sell currency.
    pub commission: Decimal,
    /// Currency being bought.
    pub receive_currency: Currency,
    /// Amount bought.
    pub receive_amount: Decimal,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// One entry per currency, in the order currencies were first held.
    balances: Vec<Balance>,
    journal: Vec<JournalEntry>,
}

impl LedgerState {
    fn find(&self, currency: &Currency) -> Option<&Balance> {
        self.balances.iter().find(|b| &b.currency == currency)
    }

    fn ensure_funds(&self, currency: &Currency, required: Decimal) -> LedgerResult<()> {
        match self.find(currency) {
            Some(balance) if balance.has_sufficient_funds(required) => Ok(()),
            held => Err(LedgerError::InsufficientFunds {
                currency: currency.clone(),
                required,
                available: held.map(|b| b.amount).unwrap_or(Decimal::ZERO),
            }),
        }
    }

    /// Check that the batch's debits and commission in `currency` are covered.
    ///
    /// A total too large to represent can never be covered.
    fn ensure_batch_funds(&self, batch: &JournalBatch, currency: &Currency) -> LedgerResult<()> {
        match batch.total_outgoing(currency) {
            Some(required) => self.ensure_funds(currency, required),
            None => Err(LedgerError::InsufficientFunds {
                currency: currency.clone(),
                required: Decimal::MAX,
                available: self.find(currency).map(|b| b.amount).unwrap_or(Decimal::ZERO),
            }),
        }
    }

    /// Apply a batch whose funds have already been checked.
    ///
    /// Every resulting balance is computed before any is written, so an
    /// overflow leaves the ledger untouched.
    fn commit(&mut self, batch: JournalBatch) -> LedgerResult<Vec<JournalEntry>> {
        let mut running: HashMap<Currency, Decimal> = HashMap::new();
        let mut balances_after = Vec::with_capacity(batch.entries.len());
        for entry in &batch.entries {
            let current = running.entry(entry.currency.clone()).or_insert_with(|| {
                self.find(&entry.currency)
                    .map(|b| b.amount)
                    .unwrap_or(Decimal::ZERO)
            });
            *current = current
                .checked_add(entry.signed_amount())
                .ok_or_else(|| LedgerError::Overflow {
                    currency: entry.currency.clone(),
                })?;
            balances_after.push(*current);
        }

        let mut committed = Vec::with_capacity(batch.entries.len());
        for (mut entry, amount) in batch.entries.into_iter().zip(balances_after) {
            match self.balances.iter_mut().find(|b| b.currency == entry.currency) {
                Some(balance) => balance.amount = amount,
                None => self.balances.push(Balance::new(entry.currency.clone(), amount)),
            }
            entry.balance_after = amount;

            self.journal.push(entry.clone());
            committed.push(entry);
        }

        Ok(committed)
    }
}

/// The wallet's balances.
///
/// Every operation holds one lock for its whole duration, so a check of
/// available funds and the update it guards can never interleave with another
/// operation.
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    /// Create a ledger seeded with 1000 EUR.
    pub fn new() -> Self {
        Self::with_opening_balance(Currency::eur(), Decimal::from(1000))
    }

    /// Create a ledger holding nothing.
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Create a ledger holding exactly one balance.
    pub fn seeded(currency: Currency, amount: Decimal) -> LedgerResult<Self> {
        validate_amount(&currency, amount)?;
        Ok(Self::with_opening_balance(currency, amount))
    }

    fn with_opening_balance(currency: Currency, amount: Decimal) -> Self {
        let mut opening = JournalEntry::credit(None, currency.clone(), amount);
        opening.balance_after = amount;

        Self {
            state: Mutex::new(LedgerState {
                balances: vec![Balance::new(currency, amount)],
                journal: vec![opening],
            }),
        }
    }

    /// Get the balance held in `currency`.
    pub fn balance(&self, currency: &Currency) -> Option<Balance> {
        self.state.lock().find(currency).cloned()
    }

    /// Get all balances in the order they were opened.
    pub fn balances(&self) -> Vec<Balance> {
        self.state.lock().balances.clone()
    }

    /// Increase the balance in `currency`, opening it if needed.
    ///
    /// A zero amount still opens the balance.
    pub fn credit(&self, currency: &Currency, amount: Decimal) -> LedgerResult<Balance> {
        validate_amount(currency, amount)?;

        let mut batch = JournalBatch::new();
        batch.add_entry(JournalEntry::credit(None, currency.clone(), amount));

        let mut state = self.state.lock();
        let entries = state.commit(batch)?;
        debug!(currency = %currency, amount = %amount, "Credited balance");
        Ok(Balance::new(currency.clone(), balance_after(&entries)))
    }

    /// Decrease the balance in `currency`.
    ///
    /// Fails if no balance is held or it is smaller than `amount`. A balance
    /// that reaches zero is kept.
    pub fn debit(&self, currency: &Currency, amount: Decimal) -> LedgerResult<Balance> {
        validate_amount(currency, amount)?;

        let mut state = self.state.lock();
        state.ensure_funds(currency, amount)?;

        let mut batch = JournalBatch::new();
        batch.add_entry(JournalEntry::debit(None, currency.clone(), amount));
        let entries = state.commit(batch)?;
        debug!(currency = %currency, amount = %amount, "Debited balance");
        Ok(Balance::new(currency.clone(), balance_after(&entries)))
    }

    /// Debit `sell_amount + commission` and credit `receive_amount` as one
    /// transaction.
    ///
    /// If the sell balance cannot cover the debit, or the receive balance
    /// would overflow, nothing changes.
    #[instrument(skip(self, legs), fields(exchange_id = %legs.exchange_id))]
    pub fn apply_exchange(&self, legs: &ExchangeLegs) -> LedgerResult<Vec<JournalEntry>> {
        validate_amount(&legs.sell_currency, legs.sell_amount)?;
        validate_amount(&legs.sell_currency, legs.commission)?;
        validate_amount(&legs.receive_currency, legs.receive_amount)?;

        let exchange_id = Some(legs.exchange_id);
        let mut batch = JournalBatch::new();
        batch.add_entry(JournalEntry::debit(
            exchange_id,
            legs.sell_currency.clone(),
            legs.sell_amount,
        ));
        if !legs.commission.is_zero() {
            batch.add_entry(JournalEntry::commission(
                exchange_id,
                legs.sell_currency.clone(),
                legs.commission,
            ));
        }
        batch.add_entry(JournalEntry::credit(
            exchange_id,
            legs.receive_currency.clone(),
            legs.receive_amount,
        ));

        let mut state = self.state.lock();
        state.ensure_batch_funds(&batch, &legs.sell_currency)?;
        let entries = state.commit(batch)?;

        info!(
            sell = %legs.sell_currency,
            sell_amount = %legs.sell_amount,
            commission = %legs.commission,
            receive = %legs.receive_currency,
            receive_amount = %legs.receive_amount,
            "Exchange applied to ledger"
        );

        Ok(entries)
    }

    /// Every entry committed so far, oldest first.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().journal.clone()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_amount(currency: &Currency, amount: Decimal) -> LedgerResult<()> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            currency: currency.clone(),
            amount,
        });
    }
    Ok(())
}

fn balance_after(entries: &[JournalEntry]) -> Decimal {
    entries
        .last()
        .map(|e| e.balance_after)
        .unwrap_or(Decimal::ZERO)
}
