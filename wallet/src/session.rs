//! Wallet session: the state a single user interacts with.
//!
//! A session owns the rate cache, the poller feeding it, the ledger and the
//! exchange engine, plus the exchange form being composed. Every input change
//! recomputes the preview; submitting applies the previewed exchange and
//! leaves a one-shot outcome message.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use fxwallet_common::{Currency, Money};
use fxwallet_fx::{
    CacheStats, CurrencyCatalog, PollerStatsSnapshot, RateCache, RatePoller, RateSource,
};
use fxwallet_ledger::{Balance, Ledger};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::config::WalletConfig;
use crate::engine::{ExchangeEngine, ExchangeReceipt};
use crate::error::{ExchangeError, ExchangeResult};
use crate::state::{ExchangePhase, SessionState};

/// Shown when the sell balance cannot cover the exchange.
pub const INSUFFICIENT_FUNDS_MESSAGE: &str = "You don't have enough amount in your wallet";

/// Exchange being composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeForm {
    /// Amount to sell.
    pub sell_amount: Decimal,
    /// Currency to sell.
    pub sell_currency: Currency,
    /// Currency to receive.
    pub receive_currency: Currency,
    /// Previewed receive amount, `None` while rates are missing.
    pub receive_amount: Option<Decimal>,
    /// Where the exchange stands.
    pub phase: ExchangePhase,
}

impl ExchangeForm {
    fn new(sell_currency: Currency) -> Self {
        let receive_currency = if sell_currency == Currency::usd() {
            Currency::eur()
        } else {
            Currency::usd()
        };
        Self {
            sell_amount: Decimal::ZERO,
            sell_currency,
            receive_currency,
            receive_amount: None,
            phase: ExchangePhase::Previewing,
        }
    }
}

/// Single-user wallet session.
pub struct WalletSession {
    cache: Arc<RateCache>,
    catalog: Arc<CurrencyCatalog>,
    engine: Arc<ExchangeEngine>,
    poller: RatePoller,
    state: RwLock<SessionState>,
    form: Mutex<ExchangeForm>,
    message: Mutex<Option<String>>,
}

impl WalletSession {
    /// Create a session that polls `source`, with the opening balance from
    /// `config`. Rates are not fetched until [`start`](Self::start).
    pub fn new(config: &WalletConfig, source: Arc<dyn RateSource>) -> ExchangeResult<Self> {
        let cache = Arc::new(RateCache::with_default_base(Currency::eur()));
        let catalog = Arc::new(CurrencyCatalog::new());
        let ledger = Arc::new(Ledger::seeded(
            config.seed_currency.clone(),
            config.seed_amount,
        )?);
        let engine = Arc::new(ExchangeEngine::new(
            cache.clone(),
            ledger,
            config.commission.clone(),
        ));
        let poller = RatePoller::new(
            source,
            cache.clone(),
            catalog.clone(),
            config.poller.clone(),
        );

        Ok(Self {
            cache,
            catalog,
            engine,
            poller,
            state: RwLock::new(SessionState::Created),
            form: Mutex::new(ExchangeForm::new(config.seed_currency.clone())),
            message: Mutex::new(None),
        })
    }

    /// Start polling rates.
    #[instrument(skip(self))]
    pub fn start(&self) -> ExchangeResult<()> {
        let mut state = self.state.write();
        match *state {
            SessionState::Running => return Ok(()),
            SessionState::Closed => return Err(ExchangeError::SessionClosed),
            SessionState::Created => {}
        }

        self.poller.start()?;
        *state = SessionState::Running;

        info!("Wallet session started");
        Ok(())
    }

    /// Stop polling and close the session.
    ///
    /// Balances stay readable; further submits fail with
    /// [`ExchangeError::SessionClosed`].
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        {
            let mut state = self.state.write();
            if state.is_terminal() {
                return;
            }
            *state = SessionState::Closed;
        }

        self.poller.stop().await;

        info!(
            conversions = self.engine.conversion_count(),
            "Wallet session closed"
        );
    }

    /// Wait until the first rate table has arrived, up to `timeout`.
    ///
    /// Returns whether rates are available. The preview is refreshed either
    /// way.
    pub async fn wait_for_rates(&self, timeout: Duration) -> bool {
        let mut updates = self.cache.subscribe();
        let ready = tokio::time::timeout(timeout, updates.wait_for(|count| *count > 0))
            .await
            .map(|arrived| arrived.is_ok())
            .unwrap_or(false);

        self.refresh_preview();
        ready
    }

    /// Set the sell amount from user text. Text that does not parse counts
    /// as zero.
    pub fn set_sell_amount_text(&self, text: &str) -> Option<Decimal> {
        let amount = Decimal::from_str(text.trim()).unwrap_or(Decimal::ZERO);
        self.set_sell_amount(amount)
    }

    /// Set the sell amount.
    pub fn set_sell_amount(&self, amount: Decimal) -> Option<Decimal> {
        self.form.lock().sell_amount = amount;
        self.refresh_preview()
    }

    /// Set the sell currency.
    ///
    /// Choosing the current receive currency moves the receive side to the
    /// first other available currency, if there is one.
    pub fn set_sell_currency(&self, currency: Currency) -> Option<Decimal> {
        {
            let mut form = self.form.lock();
            if currency == form.receive_currency {
                if let Some(other) = self
                    .catalog
                    .available()
                    .into_iter()
                    .find(|c| *c != currency)
                {
                    debug!(receive = %other, "Receive currency switched");
                    form.receive_currency = other;
                }
            }
            form.sell_currency = currency;
        }
        self.refresh_preview()
    }

    /// Set the receive currency.
    pub fn set_receive_currency(&self, currency: Currency) -> Option<Decimal> {
        self.form.lock().receive_currency = currency;
        self.refresh_preview()
    }

    /// Recompute the preview from the latest rates.
    pub fn refresh_preview(&self) -> Option<Decimal> {
        let mut form = self.form.lock();
        let preview = self
            .engine
            .convert(form.sell_amount, &form.sell_currency, &form.receive_currency)
            .ok();
        form.receive_amount = preview;
        form.phase = ExchangePhase::Previewing;
        preview
    }

    /// Current preview of the receive amount.
    pub fn preview(&self) -> Option<Decimal> {
        self.form.lock().receive_amount
    }

    /// Commission the next exchange would be charged on the current sell
    /// amount.
    pub fn commission_preview(&self) -> Money {
        let form = self.form.lock();
        Money::new(
            self.engine.commission(form.sell_amount),
            form.sell_currency.clone(),
        )
    }

    /// Copy of the exchange being composed.
    pub fn form(&self) -> ExchangeForm {
        self.form.lock().clone()
    }

    /// Where the current exchange stands.
    pub fn phase(&self) -> ExchangePhase {
        self.form.lock().phase
    }

    /// Apply the previewed exchange.
    ///
    /// The previewed receive amount is credited as shown. Without a preview,
    /// one is computed now; if rates are still missing the submit fails with
    /// a rate error and nothing changes.
    #[instrument(skip(self))]
    pub fn submit(&self) -> ExchangeResult<ExchangeReceipt> {
        if !self.state.read().accepts_exchanges() {
            return Err(ExchangeError::SessionClosed);
        }

        let form = {
            let mut form = self.form.lock();
            form.phase = ExchangePhase::Submitting;
            form.clone()
        };

        let result = self.submit_form(&form);

        let phase = match &result {
            Ok(receipt) => {
                *self.message.lock() = Some(success_message(receipt));
                ExchangePhase::Completed
            }
            Err(e) => {
                if e.is_insufficient_funds() {
                    *self.message.lock() = Some(INSUFFICIENT_FUNDS_MESSAGE.to_string());
                }
                ExchangePhase::Rejected
            }
        };
        self.form.lock().phase = phase;

        result
    }

    fn submit_form(&self, form: &ExchangeForm) -> ExchangeResult<ExchangeReceipt> {
        let receive_amount = match form.receive_amount {
            Some(amount) => amount,
            None => self.engine.convert(
                form.sell_amount,
                &form.sell_currency,
                &form.receive_currency,
            )?,
        };

        self.engine.exchange(
            form.sell_amount,
            &form.sell_currency,
            receive_amount,
            &form.receive_currency,
        )
    }

    /// Outcome of the last submit. Returns each message once.
    pub fn take_message(&self) -> Option<String> {
        self.message.lock().take()
    }

    /// Current balances.
    pub fn balances(&self) -> Vec<Balance> {
        self.engine.ledger().balances()
    }

    /// Currencies the user may pick, sorted.
    pub fn available_currencies(&self) -> Vec<Currency> {
        self.catalog.available()
    }

    /// Number of exchanges completed in this session.
    pub fn conversion_count(&self) -> u64 {
        self.engine.conversion_count()
    }

    /// Session state.
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// The exchange engine behind this session.
    pub fn engine(&self) -> &Arc<ExchangeEngine> {
        &self.engine
    }

    /// Rate cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Rate poller statistics.
    pub fn poller_stats(&self) -> PollerStatsSnapshot {
        self.poller.stats()
    }
}

fn success_message(receipt: &ExchangeReceipt) -> String {
    let mut message = format!(
        "You have converted {} to {}.",
        receipt.sold, receipt.received
    );
    if receipt.commission.is_positive() {
        message.push_str(&format!(" Commission Fee - {}.", receipt.commission));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxwallet_fx::{PollerConfig, RateSnapshot, StaticRateSource};
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    fn rates() -> RateSnapshot {
        RateSnapshot::new(
            Currency::eur(),
            vec![
                (Currency::usd(), dec!(1.08)),
                (Currency::gbp(), dec!(0.86)),
                (Currency::jpy(), dec!(129.53)),
            ],
        )
    }

    fn config() -> WalletConfig {
        WalletConfig {
            poller: PollerConfig {
                interval: Duration::from_millis(10),
            },
            ..WalletConfig::default()
        }
    }

    async fn running_session() -> WalletSession {
        let source = Arc::new(StaticRateSource::with_snapshot("test", rates()));
        let session = WalletSession::new(&config(), source).unwrap();
        assert_ok!(session.start());
        assert!(session.wait_for_rates(Duration::from_secs(2)).await);
        session
    }

    #[tokio::test]
    async fn test_preview_follows_inputs() {
        let session = running_session().await;

        assert_eq!(session.set_sell_amount_text("100"), Some(dec!(108)));
        assert_eq!(session.set_receive_currency(Currency::gbp()), Some(dec!(86)));
        assert_eq!(session.preview(), Some(dec!(86)));

        session.stop().await;
    }

    #[tokio::test]
    async fn test_unparsable_amount_is_zero() {
        let session = running_session().await;

        session.set_sell_amount_text("12,5abc");

        assert_eq!(session.form().sell_amount, Decimal::ZERO);
        assert_eq!(session.preview(), Some(Decimal::ZERO));
        session.stop().await;
    }

    #[tokio::test]
    async fn test_sell_currency_swaps_receive() {
        let session = running_session().await;
        assert_eq!(session.form().receive_currency, Currency::usd());

        session.set_sell_currency(Currency::usd());

        let form = session.form();
        assert_eq!(form.sell_currency, Currency::usd());
        assert_eq!(form.receive_currency, Currency::eur());
        session.stop().await;
    }

    #[tokio::test]
    async fn test_submit_success_message_once() {
        let session = running_session().await;
        session.set_sell_amount_text("100");

        let receipt = assert_ok!(session.submit());

        assert_eq!(receipt.sequence, 1);
        assert_eq!(session.phase(), ExchangePhase::Completed);
        assert_eq!(
            session.take_message().as_deref(),
            Some("You have converted 100.00 EUR to 108.00 USD.")
        );
        assert_eq!(session.take_message(), None);
        assert_eq!(
            session.balances(),
            vec![
                Balance::new(Currency::eur(), dec!(900)),
                Balance::new(Currency::usd(), dec!(108)),
            ]
        );
        session.stop().await;
    }

    #[tokio::test]
    async fn test_commission_in_message() {
        let session = running_session().await;
        session.set_sell_amount_text("100");
        for _ in 0..5 {
            assert_ok!(session.submit());
        }
        assert_eq!(session.commission_preview().value, dec!(0.7));

        assert_ok!(session.submit());

        assert_eq!(
            session.take_message().as_deref(),
            Some("You have converted 100.00 EUR to 108.00 USD. Commission Fee - 0.70 EUR.")
        );
        assert_eq!(session.conversion_count(), 6);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_insufficient_funds_message() {
        let session = running_session().await;
        session.set_sell_amount_text("1000.01");

        let err = assert_err!(session.submit());

        assert!(err.is_insufficient_funds());
        assert_eq!(session.phase(), ExchangePhase::Rejected);
        assert_eq!(
            session.take_message().as_deref(),
            Some(INSUFFICIENT_FUNDS_MESSAGE)
        );
        assert_eq!(
            session.balances(),
            vec![Balance::new(Currency::eur(), dec!(1000))]
        );
        session.stop().await;
    }

    #[tokio::test]
    async fn test_sell_currency_without_alternative_keeps_receive() {
        let source = Arc::new(StaticRateSource::new("empty"));
        let session = WalletSession::new(&config(), source).unwrap();

        assert_eq!(session.set_sell_currency(Currency::usd()), None);

        let form = session.form();
        assert_eq!(form.sell_currency, Currency::usd());
        assert_eq!(form.receive_currency, Currency::usd());
        assert_eq!(form.receive_amount, None);
    }

    #[tokio::test]
    async fn test_unrepresentable_charged_sell_is_insufficient() {
        let session = running_session().await;
        session.set_sell_amount_text("100");
        for _ in 0..5 {
            assert_ok!(session.submit());
        }
        session.take_message();
        session.set_receive_currency(Currency::gbp());

        assert!(session.set_sell_amount(Decimal::MAX).is_some());
        let err = assert_err!(session.submit());

        assert!(err.is_insufficient_funds());
        assert_eq!(
            session.take_message().as_deref(),
            Some(INSUFFICIENT_FUNDS_MESSAGE)
        );
        assert_eq!(
            session.balances(),
            vec![
                Balance::new(Currency::eur(), dec!(500)),
                Balance::new(Currency::usd(), dec!(540)),
            ]
        );
        session.stop().await;
    }

    #[tokio::test]
    async fn test_no_rates_yet() {
        let source = Arc::new(StaticRateSource::new("empty"));
        let session = WalletSession::new(&config(), source).unwrap();

        assert_eq!(session.set_sell_amount_text("10"), None);
        assert!(session.available_currencies().is_empty());

        let err = assert_err!(session.submit());
        assert!(err.is_rate_unavailable());
        assert_eq!(session.take_message(), None);
        assert_eq!(session.conversion_count(), 0);
    }

    #[tokio::test]
    async fn test_available_currencies() {
        let session = running_session().await;

        assert_eq!(
            session.available_currencies(),
            vec![Currency::eur(), Currency::gbp(), Currency::jpy(), Currency::usd()]
        );
        session.stop().await;
    }

    #[tokio::test]
    async fn test_closed_session() {
        let session = running_session().await;
        session.stop().await;
        session.set_sell_amount_text("1");

        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(session.submit(), Err(ExchangeError::SessionClosed)));
        assert!(matches!(session.start(), Err(ExchangeError::SessionClosed)));
        assert_eq!(session.balances().len(), 1);
    }
}
