//! Latest-snapshot rate cache.

use std::sync::Arc;

use chrono::Duration;
use fxwallet_common::Currency;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::debug;

use crate::snapshot::RateSnapshot;

/// Holds the most recent rate snapshot.
///
/// Updates swap an `Arc` under a short write lock, so readers only ever wait
/// for a pointer swap and always see one complete snapshot. The number of
/// updates so far is published on a watch channel.
pub struct RateCache {
    current: RwLock<Option<Arc<RateSnapshot>>>,
    default_base: Currency,
    updates: watch::Sender<u64>,
}

impl RateCache {
    /// Create an empty cache whose fallback base currency is EUR.
    pub fn new() -> Self {
        Self::with_default_base(Currency::eur())
    }

    /// Create an empty cache with a custom fallback base currency.
    pub fn with_default_base(default_base: Currency) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            current: RwLock::new(None),
            default_base,
            updates,
        }
    }

    /// Replace the current snapshot unconditionally.
    pub fn update(&self, snapshot: RateSnapshot) {
        debug!(
            base = %snapshot.base(),
            rates = snapshot.len(),
            "Rate cache updated"
        );
        *self.current.write() = Some(Arc::new(snapshot));
        self.updates.send_modify(|count| *count += 1);
    }

    /// Receiver of the update count. A count above zero means a snapshot is
    /// present.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// The latest snapshot, if one has ever arrived.
    pub fn latest(&self) -> Option<Arc<RateSnapshot>> {
        self.current.read().clone()
    }

    /// The latest snapshot, or an empty one on the fallback base currency.
    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        self.latest()
            .unwrap_or_else(|| Arc::new(RateSnapshot::empty(self.default_base.clone())))
    }

    /// Base currency of the latest snapshot, or the fallback.
    pub fn current_base(&self) -> Currency {
        self.current
            .read()
            .as_ref()
            .map(|s| s.base().clone())
            .unwrap_or_else(|| self.default_base.clone())
    }

    /// Rate for `currency` from the latest snapshot; `None` if unknown.
    pub fn rate(&self, currency: &Currency) -> Option<Decimal> {
        self.current.read().as_ref().and_then(|s| s.rate(currency))
    }

    /// Whether any snapshot has arrived yet.
    pub fn has_snapshot(&self) -> bool {
        self.current.read().is_some()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let latest = self.latest();
        CacheStats {
            has_snapshot: latest.is_some(),
            rate_count: latest.as_ref().map(|s| s.len()).unwrap_or(0),
            age: latest.as_ref().map(|s| s.age()),
            updates: *self.updates.borrow(),
        }
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub has_snapshot: bool,
    pub rate_count: usize,
    pub age: Option<Duration>,
    pub updates: u64,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
