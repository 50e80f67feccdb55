//! # Crossover Agent — Single-Symbol EMA Trading Bot
//!
//! ## Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────┐
//!   Ctrl-C ─────────▶│ Supervisor                       │
//!                    │   startup: self-test round trip  │
//!                    │   loop:    Controller::cycle     │
//!                    │            sleep poll | cooldown │
//!                    └──────────────────────────────────┘
//!                        │              │            │
//!                 bars / trades      orders      messages
//!                        ▼              ▼            ▼
//!                 ┌────────────┐ ┌────────────┐ ┌──────────┐
//!                 │ MarketData │ │   Broker   │ │ Webhook  │
//!                 └────────────┘ └────────────┘ └──────────┘
//!                        └── AlpacaClient ──┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable        | Default                            | Description                  |
//! |-----------------|------------------------------------|------------------------------|
//! | `API_KEY`       | —                                  | Brokerage key (required)     |
//! | `API_SECRET`    | —                                  | Brokerage secret (required)  |
//! | `SYMBOL`        | —                                  | Traded symbol (required)     |
//! | `EMA_FAST`      | —                                  | Fast EMA period (required)   |
//! | `EMA_SLOW`      | —                                  | Slow EMA period (required)   |
//! | `PROFIT_TARGET` | —                                  | Exit delta per share (req.)  |
//! | `BASE_URL`      | `https://paper-api.alpaca.markets` | Trading endpoint             |
//! | `WEBHOOK_URL`   | unset (log only)                   | Notification webhook         |
//! | `DRY_RUN`       | `false`                            | Log orders instead of sending|
//! | `RUST_LOG`      | `crossover_agent=debug`            | Tracing filter               |
//!
//! The rest are listed in `config.rs`.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod clock;
mod config;
mod engine;
mod error;
mod gateway;
mod models;
mod notify;
#[cfg(test)]
mod testing;

use clock::SystemClock;
use config::Config;
use engine::controller::Controller;
use engine::supervisor::Supervisor;
use gateway::alpaca::AlpacaClient;
use notify::webhook::{LogSink, WebhookSink};
use notify::{NotificationSink, Notifier};

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — real env vars win in production) ────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()
            .add_directive("crossover_agent=debug".parse()?)
            .add_directive("reqwest=warn".parse()?))
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        CROSSOVER AGENT — EMA Trading Bot      ║
  ║        Poll · Decide · Execute · Report       ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 3. Configuration ─────────────────────────────────────────────────────
    let config = Arc::new(Config::from_env().context("Failed to load config")?);

    info!(
        symbol        = %config.symbol,
        timeframe     = %config.timeframe,
        ema_fast      = config.strategy.ema_fast,
        ema_slow      = config.strategy.ema_slow,
        profit_target = config.strategy.profit_target,
        trade_qty     = config.strategy.trade_qty,
        timezone      = %config.schedule.timezone,
        dry_run       = config.alpaca.dry_run,
        "⚙️ Config loaded"
    );
    if config.alpaca.dry_run {
        warn!("🎭 DRY RUN — orders will be logged, not sent");
    }

    // ── 4. Gateways ──────────────────────────────────────────────────────────
    let client = reqwest::Client::builder()
        .user_agent(concat!("crossover-agent/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let alpaca = Arc::new(AlpacaClient::new(config.alpaca.clone(), client.clone()));

    let sink: Arc<dyn NotificationSink> = match &config.webhook_url {
        Some(url) => Arc::new(WebhookSink::new(client, url, config.alpaca.request_timeout)),
        None => Arc::new(LogSink::new()),
    };
    let notifier = Notifier::new(sink, &config.symbol);

    // ── 5. Startup notice (best effort) ──────────────────────────────────────
    let notice = format!(
        "Trading bot started for {}: EMA {}/{}, profit target ${}, qty {}",
        config.symbol,
        config.strategy.ema_fast,
        config.strategy.ema_slow,
        config.strategy.profit_target,
        config.strategy.trade_qty,
    );
    if let Err(e) = notifier.send(&notice).await {
        warn!(error = %e, "Startup notification failed");
    }

    // ── 6. Run until Ctrl-C ──────────────────────────────────────────────────
    let controller = Controller::new(
        config.clone(),
        alpaca.clone(),
        alpaca,
        notifier,
        Arc::new(SystemClock),
    );
    let mut supervisor = Supervisor::new(controller);

    tokio::select! {
        _ = supervisor.run() => {}
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => info!("🛑 Ctrl-C received — shutting down"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C — shutting down"),
        },
    }

    Ok(())
}
