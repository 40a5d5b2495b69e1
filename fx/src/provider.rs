//! Rate source trait and test double.

use async_trait::async_trait;

use crate::error::FxResult;
use crate::snapshot::RateSnapshot;

/// Anything that can produce a fresh table of exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch the current rates.
    ///
    /// Every failure (transport, status, decoding) is reported as
    /// [`crate::FxError::Fetch`].
    async fn fetch(&self) -> FxResult<RateSnapshot>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::StaticRateSource;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::RateSource;
    use crate::error::{FxError, FxResult};
    use crate::snapshot::RateSnapshot;

    /// Rate source returning a fixed snapshot, for tests.
    ///
    /// Counts every call to `fetch`, can be switched to fail, and can delay
    /// its answer to simulate a slow provider.
    pub struct StaticRateSource {
        name: String,
        snapshot: Mutex<Option<RateSnapshot>>,
        failing: AtomicBool,
        delay: Mutex<Option<Duration>>,
        calls: AtomicUsize,
    }

    impl StaticRateSource {
        /// Create a source with no snapshot; it fails until one is set.
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                snapshot: Mutex::new(None),
                failing: AtomicBool::new(false),
                delay: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        /// Create a source that returns `snapshot`.
        pub fn with_snapshot(name: impl Into<String>, snapshot: RateSnapshot) -> Self {
            let source = Self::new(name);
            source.set_snapshot(snapshot);
            source
        }

        /// Set the snapshot returned by later fetches.
        pub fn set_snapshot(&self, snapshot: RateSnapshot) {
            *self.snapshot.lock() = Some(snapshot);
        }

        /// Make later fetches fail (or succeed again).
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Delay every fetch by `delay`.
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }

        /// Number of times `fetch` was called.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for StaticRateSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self) -> FxResult<RateSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.failing.load(Ordering::SeqCst) {
                return Err(FxError::fetch(&self.name, "simulated failure"));
            }

            self.snapshot
                .lock()
                .clone()
                .ok_or_else(|| FxError::fetch(&self.name, "no snapshot configured"))
        }
    }
}
