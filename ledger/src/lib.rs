//! fxwallet Ledger
//!
//! Multi-currency balances with an all-or-nothing exchange update and an
//! in-memory journal of every balance change.

pub mod engine;
pub mod journal;
pub mod balance;
pub mod error;

pub use engine::{ExchangeLegs, Ledger};
pub use journal::{EntryType, JournalBatch, JournalEntry};
pub use balance::Balance;
pub use error::{LedgerError, LedgerResult};
