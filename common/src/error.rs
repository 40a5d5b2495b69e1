//! Error types shared by the wallet crates.

use thiserror::Error;

/// Errors raised while constructing common value types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    /// Currency code is not three ASCII letters.
    #[error("Invalid currency code: {0:?}")]
    InvalidCode(String),
}

/// Result type alias for common value construction.
pub type Result<T> = std::result::Result<T, CurrencyError>;
