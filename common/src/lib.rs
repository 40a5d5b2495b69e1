//! fxwallet Common Types
//!
//! Shared types used across the wallet crates: currency codes and the
//! well-known currency allow-list, monetary amounts, and exchange identifiers.

pub mod identifiers;
pub mod monetary;
pub mod error;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
