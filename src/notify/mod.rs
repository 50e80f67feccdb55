//! # notify — operational messages
//!
//! [`Notifier`] owns the wording; a [`NotificationSink`] only delivers text.
//! Delivery is fire-and-forget from the trading point of view, but a failure
//! is still returned so the cycle that triggered it is reported like any other.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use tracing::info;

use crate::engine::stats::DailyStats;
use crate::error::AgentError;

pub mod webhook;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn post(&self, message: &str) -> Result<(), AgentError>;
}

// ─── Notifier ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Notifier {
    sink:   Arc<dyn NotificationSink>,
    symbol: String,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>, symbol: &str) -> Self {
        Self { sink, symbol: symbol.to_string() }
    }

    /// Raw text to the sink.
    pub async fn send(&self, message: &str) -> Result<(), AgentError> {
        info!(message, "📣 Notify");
        self.sink.post(message).await
    }

    pub async fn outside_hours(&self, local_time: NaiveTime) -> Result<(), AgentError> {
        self.send(&format!(
            "Outside trading hours: {}. Sleeping...",
            local_time.format("%H:%M:%S")
        ))
        .await
    }

    pub async fn test_buy(&self, symbol: &str, price: f64) -> Result<(), AgentError> {
        self.send(&format!("Test Buy: Bought 1 share of {symbol} at ${price}")).await
    }

    pub async fn test_sell(&self, symbol: &str, price: f64) -> Result<(), AgentError> {
        self.send(&format!("Test Sell: Sold 1 share of {symbol} at ${price}")).await
    }

    pub async fn bought(&self, quantity: f64, price: f64) -> Result<(), AgentError> {
        self.send(&format!("Bought {quantity} shares of {} at ${price}", self.symbol)).await
    }

    pub async fn sell_check(
        &self,
        entry_price: f64,
        current_price: f64,
        profit_target: f64,
    ) -> Result<(), AgentError> {
        self.send(&format!(
            "Checking sell condition: entry_price={entry_price}, current_price={current_price}, profit_target={profit_target}"
        ))
        .await
    }

    pub async fn sold(&self, quantity: f64, price: f64, profit: f64) -> Result<(), AgentError> {
        self.send(&format!(
            "Sold {quantity} shares of {} at ${price}. Profit: ${profit:.2}",
            self.symbol
        ))
        .await
    }

    pub async fn heartbeat(&self, local_now: DateTime<Tz>) -> Result<(), AgentError> {
        self.send(&format!(
            "Heartbeat: {} - Script is running",
            local_now.format("%Y-%m-%d %H:%M:%S %Z")
        ))
        .await
    }

    pub async fn send_daily_report(&self, date: NaiveDate, stats: &DailyStats) -> Result<(), AgentError> {
        self.send(&daily_report(&self.symbol, date, stats)).await
    }

    /// Description only, no debug detail.
    pub async fn error(&self, description: &str) -> Result<(), AgentError> {
        self.send(&format!("An error occurred: {description}")).await
    }
}

/// Multi-line end-of-day summary.
pub fn daily_report(symbol: &str, date: NaiveDate, stats: &DailyStats) -> String {
    format!(
        "Daily Trading Report for {symbol}\n\
         Date: {date}\n\
         Total Trades: {}\n\
         Profitable Trades: {}\n\
         Total Profit: ${:.2}\n\
         Win Rate: {:.2}%",
        stats.total_trades(),
        stats.profitable_trades(),
        stats.total_profit(),
        stats.compute_win_rate(),
    )
}
