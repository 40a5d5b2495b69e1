//! Identifier types for wallet entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a completed exchange.
/// Uses UUID v7 so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    /// Create a new exchange ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_id_serializes_as_uuid() {
        let id = ExchangeId::new();
        let json = serde_json::to_string(&id).unwrap();

        assert_eq!(json, format!("\"{}\"", id));
        assert_eq!(serde_json::from_str::<ExchangeId>(&json).unwrap(), id);
        assert_ne!(id, ExchangeId::new());
    }
}
