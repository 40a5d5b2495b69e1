//! Exchange engine: conversion previews and committed exchanges.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fxwallet_common::{Currency, ExchangeId, Money};
use fxwallet_fx::{FxResult, RateCache};
use fxwallet_ledger::{ExchangeLegs, Ledger, LedgerError};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::commission::CommissionPolicy;
use crate::error::{ExchangeError, ExchangeResult};
use crate::metrics::{SharedMetrics, WalletMetrics};

/// Outcome of a completed exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeReceipt {
    /// Exchange ID shared by its journal entries.
    pub id: ExchangeId,
    /// Amount sold, excluding commission.
    pub sold: Money,
    /// Commission charged in the sell currency.
    pub commission: Money,
    /// Amount received.
    pub received: Money,
    /// Number of exchanges completed, including this one.
    pub sequence: u64,
    /// When the exchange was applied.
    pub executed_at: DateTime<Utc>,
}

/// Computes previews from the rate cache and applies exchanges to the ledger.
///
/// The engine is the only writer of the ledger. It holds the conversion
/// counter under a lock that also spans the ledger update, so concurrent
/// submits are applied one at a time and each sees the counter left by the
/// previous one.
pub struct ExchangeEngine {
    cache: Arc<RateCache>,
    ledger: Arc<Ledger>,
    policy: CommissionPolicy,
    conversions: Mutex<u64>,
    metrics: SharedMetrics,
}

impl ExchangeEngine {
    /// Create a new engine.
    pub fn new(cache: Arc<RateCache>, ledger: Arc<Ledger>, policy: CommissionPolicy) -> Self {
        Self {
            cache,
            ledger,
            policy,
            conversions: Mutex::new(0),
            metrics: Arc::new(WalletMetrics::new()),
        }
    }

    /// Convert `amount` using the latest rates.
    ///
    /// Fails with [`fxwallet_fx::FxError::RateUnavailable`] until the cache has
    /// a rate for every non-base currency involved.
    pub fn convert(&self, amount: Decimal, from: &Currency, to: &Currency) -> FxResult<Decimal> {
        let result = self.cache.snapshot().convert(amount, from, to);
        self.metrics.preview(result.is_ok());
        result
    }

    /// Commission the next exchange of `amount` would be charged.
    pub fn commission(&self, amount: Decimal) -> Decimal {
        self.policy.commission(*self.conversions.lock(), amount)
    }

    /// Sell `sell_amount` of `sell_currency` for `receive_amount` of
    /// `receive_currency`.
    ///
    /// `receive_amount` is taken as given, normally the caller's latest
    /// preview; it is not recomputed from current rates.
    #[instrument(skip(self), fields(sell = %sell_currency, receive = %receive_currency))]
    pub fn exchange(
        &self,
        sell_amount: Decimal,
        sell_currency: &Currency,
        receive_amount: Decimal,
        receive_currency: &Currency,
    ) -> ExchangeResult<ExchangeReceipt> {
        if sell_amount < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(sell_amount));
        }
        if receive_amount < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount(receive_amount));
        }
        if sell_currency == receive_currency {
            return Err(ExchangeError::SameCurrency(sell_currency.clone()));
        }

        let mut conversions = self.conversions.lock();
        let commission = self.policy.commission(*conversions, sell_amount);

        let legs = ExchangeLegs {
            exchange_id: ExchangeId::new(),
            sell_currency: sell_currency.clone(),
            sell_amount,
            commission,
            receive_currency: receive_currency.clone(),
            receive_amount,
        };

        match self.ledger.apply_exchange(&legs) {
            Ok(entries) => {
                *conversions += 1;
                let sequence = *conversions;
                drop(conversions);

                self.metrics.exchange_completed(!commission.is_zero());
                debug!(entries = entries.len(), "Journal entries committed");
                info!(
                    exchange_id = %legs.exchange_id,
                    sell_amount = %sell_amount,
                    commission = %commission,
                    receive_amount = %receive_amount,
                    sequence,
                    "Exchange completed"
                );

                Ok(ExchangeReceipt {
                    id: legs.exchange_id,
                    sold: Money::new(sell_amount, legs.sell_currency),
                    commission: Money::new(commission, sell_currency.clone()),
                    received: Money::new(receive_amount, legs.receive_currency),
                    sequence,
                    executed_at: Utc::now(),
                })
            }
            Err(e) => {
                if let LedgerError::InsufficientFunds { .. } = e {
                    self.metrics.exchange_rejected();
                }
                warn!(error = %e, "Exchange rejected");
                Err(e.into())
            }
        }
    }

    /// Number of exchanges completed so far.
    pub fn conversion_count(&self) -> u64 {
        *self.conversions.lock()
    }

    /// The ledger this engine writes to.
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// The rate cache this engine reads from.
    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    /// Activity counters.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }
}
