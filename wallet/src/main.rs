//! fxwallet CLI
//!
//! Starts a wallet session against the HTTP rate source, optionally performs
//! one exchange, and prints the outcome.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use fxwallet_common::Currency;
use fxwallet_fx::HttpRateSource;
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxwallet::{WalletConfig, WalletSession};

/// Multi-currency wallet CLI
#[derive(Parser, Debug)]
#[command(name = "wallet")]
#[command(about = "Multi-currency wallet with live exchange rates")]
struct Args {
    /// Seconds to wait for the first rate table
    #[arg(long, default_value = "10")]
    wait_secs: u64,

    /// Amount to sell
    #[arg(long)]
    sell_amount: Option<String>,

    /// Currency to sell
    #[arg(long)]
    sell: Option<Currency>,

    /// Currency to receive
    #[arg(long)]
    receive: Option<Currency>,

    /// Emit JSON logs and a JSON summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = WalletConfig::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    if args.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(url = %config.http.url, "Starting wallet");

    let source = Arc::new(HttpRateSource::new(config.http.clone())?);
    let session = WalletSession::new(&config, source)?;
    session.start()?;

    if !session
        .wait_for_rates(Duration::from_secs(args.wait_secs))
        .await
    {
        warn!(wait_secs = args.wait_secs, "No rates received yet");
    }

    let available = session.available_currencies();
    if !args.json {
        let codes: Vec<&str> = available.iter().map(|c| c.code()).collect();
        println!("Available currencies: {}", codes.join(", "));
    }

    if let Some(sell) = args.sell {
        session.set_sell_currency(sell);
    }
    if let Some(receive) = args.receive {
        session.set_receive_currency(receive);
    }

    let mut receipt = None;
    if let Some(amount) = &args.sell_amount {
        session.set_sell_amount_text(amount);
        let form = session.form();
        info!(
            sell_amount = %form.sell_amount,
            sell = %form.sell_currency,
            receive = %form.receive_currency,
            preview = ?form.receive_amount,
            commission = %session.commission_preview(),
            "Submitting exchange"
        );
        match session.submit() {
            Ok(r) => receipt = Some(r),
            Err(e) if e.is_insufficient_funds() => {}
            Err(e) => warn!(error = %e, code = e.error_code(), "Exchange failed"),
        }
    }
    let message = session.take_message();

    session.stop().await;

    let poller = session.poller_stats();
    let cache = session.cache_stats();
    info!(
        fetch_attempts = poller.attempts,
        fetch_failures = poller.failures,
        cache_updates = cache.updates,
        rate_count = cache.rate_count,
        "Rate polling summary"
    );

    let balances = session.balances();
    if args.json {
        let summary = json!({
            "available": available,
            "message": message,
            "receipt": receipt,
            "balances": balances,
            "conversions": session.conversion_count(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        if let Some(message) = message {
            println!("{message}");
        }
        println!("Balances:");
        for balance in balances {
            println!("  {}", balance.as_money());
        }
    }

    Ok(())
}
