//! Background rate refresh loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cache::RateCache;
use crate::catalog::CurrencyCatalog;
use crate::error::{FxError, FxResult};
use crate::provider::RateSource;

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between the end of one fetch attempt and the start of the next.
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Poller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Created, not started.
    Idle,
    /// Background task is polling.
    Running,
    /// Stopped for good.
    Stopped,
}

impl PollerState {
    /// Check if the poller is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollerState::Stopped)
    }
}

/// Fetch attempt counters.
#[derive(Debug, Default)]
pub struct PollerStats {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
}

impl PollerStats {
    /// Get a point-in-time copy.
    pub fn snapshot(&self) -> PollerStatsSnapshot {
        PollerStatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time poller counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerStatsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
}

/// Repeatedly fetches rates into a [`RateCache`] until stopped.
///
/// Fetch failures are logged and otherwise ignored; the next attempt happens
/// one interval later with no backoff.
pub struct RatePoller {
    source: Arc<dyn RateSource>,
    cache: Arc<RateCache>,
    catalog: Arc<CurrencyCatalog>,
    config: PollerConfig,
    state: RwLock<PollerState>,
    stats: Arc<PollerStats>,
    shutdown_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RatePoller {
    /// Create an idle poller.
    pub fn new(
        source: Arc<dyn RateSource>,
        cache: Arc<RateCache>,
        catalog: Arc<CurrencyCatalog>,
        config: PollerConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            source,
            cache,
            catalog,
            config,
            state: RwLock::new(PollerState::Idle),
            stats: Arc::new(PollerStats::default()),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Spawn the polling task on the current tokio runtime.
    ///
    /// Starting a running poller does nothing; a stopped poller cannot be
    /// restarted.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub fn start(&self) -> FxResult<()> {
        let mut state = self.state.write();
        match *state {
            PollerState::Running => return Ok(()),
            PollerState::Stopped => return Err(FxError::PollerStopped),
            PollerState::Idle => {}
        }

        let worker = PollWorker {
            source: self.source.clone(),
            cache: self.cache.clone(),
            catalog: self.catalog.clone(),
            stats: self.stats.clone(),
            interval: self.config.interval,
            shutdown_rx: self.shutdown_tx.subscribe(),
        };
        *self.task.lock() = Some(tokio::spawn(worker.run()));
        *state = PollerState::Running;

        info!(interval_ms = self.config.interval.as_millis() as u64, "Rate poller started");
        Ok(())
    }

    /// Stop polling and wait for the task to exit.
    ///
    /// Once this returns the source is not called again and the cache is not
    /// written again.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn stop(&self) {
        {
            let mut state = self.state.write();
            if *state == PollerState::Stopped {
                return;
            }
            *state = PollerState::Stopped;
        }

        self.shutdown_tx.send_replace(true);

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Rate poller task ended abnormally");
                }
            }
        }

        info!("Rate poller stopped");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollerState {
        *self.state.read()
    }

    /// Fetch counters.
    pub fn stats(&self) -> PollerStatsSnapshot {
        self.stats.snapshot()
    }
}

impl Drop for RatePoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

/// State moved into the spawned task.
struct PollWorker {
    source: Arc<dyn RateSource>,
    cache: Arc<RateCache>,
    catalog: Arc<CurrencyCatalog>,
    stats: Arc<PollerStats>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollWorker {
    async fn run(mut self) {
        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            self.stats.attempts.fetch_add(1, Ordering::Relaxed);
            let result = tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => break,
                result = self.source.fetch() => result,
            };

            match result {
                Ok(snapshot) => {
                    if *self.shutdown_rx.borrow() {
                        break;
                    }
                    let new_codes = self.catalog.merge(&snapshot);
                    debug!(
                        source = self.source.name(),
                        base = %snapshot.base(),
                        rates = snapshot.len(),
                        new_codes,
                        "Fetched rates"
                    );
                    self.cache.update(snapshot);
                    self.stats.successes.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(source = self.source.name(), error = %e, "Rate fetch failed");
                }
            }

            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!(source = self.source.name(), "Rate poll loop exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticRateSource;
    use crate::snapshot::RateSnapshot;
    use fxwallet_common::Currency;
    use rust_decimal_macros::dec;

    fn setup(interval_ms: u64) -> (Arc<StaticRateSource>, Arc<RateCache>, Arc<CurrencyCatalog>, RatePoller) {
        let source = Arc::new(StaticRateSource::with_snapshot(
            "test",
            RateSnapshot::new(
                Currency::eur(),
                vec![(Currency::usd(), dec!(1.08)), (Currency::new("BTC"), dec!(0.00002))],
            ),
        ));
        let cache = Arc::new(RateCache::new());
        let catalog = Arc::new(CurrencyCatalog::new());
        let poller = RatePoller::new(
            source.clone(),
            cache.clone(),
            catalog.clone(),
            PollerConfig {
                interval: Duration::from_millis(interval_ms),
            },
        );
        (source, cache, catalog, poller)
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[test]
    fn test_default_interval() {
        assert_eq!(PollerConfig::default().interval, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_poller_lifecycle() {
        let (_, _, _, poller) = setup(10);
        assert_eq!(poller.state(), PollerState::Idle);

        poller.start().unwrap();
        assert_eq!(poller.state(), PollerState::Running);
        // Starting twice is harmless.
        poller.start().unwrap();

        poller.stop().await;
        assert_eq!(poller.state(), PollerState::Stopped);
        assert!(poller.state().is_terminal());
        assert!(matches!(poller.start(), Err(FxError::PollerStopped)));
    }

    #[tokio::test]
    async fn test_poller_fills_cache_and_catalog() {
        let (_, cache, catalog, poller) = setup(10);
        poller.start().unwrap();

        wait_for(|| cache.has_snapshot()).await;

        assert_eq!(cache.rate(&Currency::usd()), Some(dec!(1.08)));
        assert_eq!(catalog.available(), vec![Currency::eur(), Currency::usd()]);
        poller.stop().await;
    }

    #[tokio::test]
    async fn test_poller_repeats_on_interval() {
        let (source, _, _, poller) = setup(5);
        poller.start().unwrap();

        wait_for(|| source.calls() >= 3).await;
        poller.stop().await;

        let stats = poller.stats();
        assert!(stats.attempts >= 3);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test]
    async fn test_poller_survives_failures() {
        let (source, cache, _, poller) = setup(5);
        source.set_failing(true);
        poller.start().unwrap();

        wait_for(|| poller.stats().failures >= 2).await;
        assert!(!cache.has_snapshot());

        source.set_failing(false);
        wait_for(|| cache.has_snapshot()).await;
        assert_eq!(poller.state(), PollerState::Running);

        poller.stop().await;
    }

    #[tokio::test]
    async fn test_stopped_poller_goes_quiet() {
        let (source, cache, _, poller) = setup(5);
        poller.start().unwrap();
        wait_for(|| source.calls() >= 2).await;

        poller.stop().await;
        let calls = source.calls();
        let updates = cache.stats().updates;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(source.calls(), calls);
        assert_eq!(cache.stats().updates, updates);
    }

    #[tokio::test]
    async fn test_stop_abandons_slow_fetch() {
        let (source, cache, _, poller) = setup(5);
        source.set_delay(Duration::from_secs(30));
        poller.start().unwrap();
        wait_for(|| source.calls() == 1).await;

        tokio::time::timeout(Duration::from_secs(1), poller.stop())
            .await
            .expect("stop should not wait for the in-flight fetch");

        assert!(!cache.has_snapshot());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_interrupts_long_interval() {
        let (source, _, _, poller) = setup(60_000);
        poller.start().unwrap();
        wait_for(|| source.calls() == 1).await;

        tokio::time::timeout(Duration::from_secs(1), poller.stop())
            .await
            .expect("stop should not wait for the full interval");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let (source, _, _, poller) = setup(5);
        poller.stop().await;

        assert_eq!(poller.state(), PollerState::Stopped);
        assert!(poller.start().is_err());
        assert_eq!(source.calls(), 0);
    }
}
