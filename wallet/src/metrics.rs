//! Wallet activity counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for exchanges and previews.
#[derive(Debug, Default)]
pub struct WalletMetrics {
    /// Exchanges applied to the ledger.
    pub exchanges_completed: AtomicU64,
    /// Exchanges rejected for lack of funds.
    pub exchanges_rejected: AtomicU64,
    /// Exchanges that charged a commission.
    pub exchanges_charged: AtomicU64,
    /// Previews computed.
    pub previews_served: AtomicU64,
    /// Previews that could not be computed for lack of rates.
    pub previews_unavailable: AtomicU64,
}

impl WalletMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed exchange.
    pub fn exchange_completed(&self, charged: bool) {
        self.exchanges_completed.fetch_add(1, Ordering::Relaxed);
        if charged {
            self.exchanges_charged.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an exchange rejected for insufficient funds.
    pub fn exchange_rejected(&self) {
        self.exchanges_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a preview outcome.
    pub fn preview(&self, available: bool) {
        if available {
            self.previews_served.fetch_add(1, Ordering::Relaxed);
        } else {
            self.previews_unavailable.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            exchanges_completed: self.exchanges_completed.load(Ordering::Relaxed),
            exchanges_rejected: self.exchanges_rejected.load(Ordering::Relaxed),
            exchanges_charged: self.exchanges_charged.load(Ordering::Relaxed),
            previews_served: self.previews_served.load(Ordering::Relaxed),
            previews_unavailable: self.previews_unavailable.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub exchanges_completed: u64,
    pub exchanges_rejected: u64,
    pub exchanges_charged: u64,
    pub previews_served: u64,
    pub previews_unavailable: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<WalletMetrics>;
