//! # engine::controller
//!
//! **Trading Loop Controller** — runs one cycle at a time.
//!
//! ## Cycle (every poll interval)
//! ```text
//! 1. Local time in the session zone
//! 2. Outside [start, end]          → notify, stop here
//! 3. Fetch bar window, compute EMAs
//! 4. Latest trade price
//! 5. Refresh position from broker
//! 6. decide() → Enter / CheckExit / Exit
//! 7. Daily report latch (≥ cutoff, once per day)
//! 8. Heartbeat timer
//! ```
//!
//! The self-test round trip is a separate startup phase ([`Controller::startup`])
//! that must complete before [`Controller::cycle`] trades. Sleeping between
//! cycles and error reporting belong to the supervisor.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::clock::{self, Clock};
use crate::config::Config;
use crate::engine::decision::{self, Action, Decision, MarketView, Phase};
use crate::engine::position::PositionTracker;
use crate::engine::schedule::{HeartbeatState, ReportState};
use crate::engine::signal;
use crate::engine::stats::DailyStats;
use crate::error::AgentError;
use crate::gateway::{BarsRequest, Broker, MarketData};
use crate::models::{OrderRequest, OrderSide};
use crate::notify::Notifier;

// ─── Loop State ───────────────────────────────────────────────────────────────

/// Everything carried from one cycle to the next. Owned by the controller alone.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub tracker:        PositionTracker,
    pub stats:          DailyStats,
    pub report:         ReportState,
    pub heartbeat:      HeartbeatState,
    pub self_test_done: bool,
}

impl LoopState {
    pub fn new(symbol: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            tracker:        PositionTracker::new(symbol),
            stats:          DailyStats::new(),
            report:         ReportState::new(),
            heartbeat:      HeartbeatState::starting_at(started_at),
            self_test_done: false,
        }
    }
}

// ─── Controller ───────────────────────────────────────────────────────────────

pub struct Controller {
    config:   Arc<Config>,
    market:   Arc<dyn MarketData>,
    broker:   Arc<dyn Broker>,
    notifier: Notifier,
    clock:    Arc<dyn Clock>,
    state:    LoopState,
}

impl Controller {
    pub fn new(
        config:   Arc<Config>,
        market:   Arc<dyn MarketData>,
        broker:   Arc<dyn Broker>,
        notifier: Notifier,
        clock:    Arc<dyn Clock>,
    ) -> Self {
        let state = LoopState::new(&config.symbol, clock.now());
        Self { config, market, broker, notifier, clock, state }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn self_test_done(&self) -> bool {
        self.state.self_test_done
    }

    fn local_now(&self) -> (DateTime<Utc>, DateTime<Tz>) {
        let now = self.clock.now();
        (now, clock::local(now, self.config.schedule.timezone))
    }

    // ─── Startup phase ────────────────────────────────────────────────────────

    /// Runs the one-time self-test once inside trading hours.
    ///
    /// Returns the phase handled: `OutsideHours` while waiting for the
    /// session, `SelfTest` once the round trip has completed (or already had).
    pub async fn startup(&mut self) -> Result<Phase, AgentError> {
        if self.state.self_test_done {
            return Ok(Phase::SelfTest);
        }

        let (_, local) = self.local_now();
        let in_window = self.config.schedule.in_trading_window(local.time());

        match decision::gate(in_window, false) {
            Some(Phase::OutsideHours) => {
                self.notifier.outside_hours(local.time()).await?;
                Ok(Phase::OutsideHours)
            }
            _ => {
                self.run_self_test().await?;
                Ok(Phase::SelfTest)
            }
        }
    }

    /// 1-share buy then sell on the test symbol to prove the gateway works.
    async fn run_self_test(&mut self) -> Result<(), AgentError> {
        let symbol = self.config.test_symbol.clone();
        info!(symbol = %symbol, "🧪 Self-test round trip starting");

        self.broker
            .submit_order(&OrderRequest::market(&symbol, 1.0, OrderSide::Buy))
            .await?;
        let bought_at = self.broker.latest_trade(&symbol).await?.price;
        self.notifier.test_buy(&symbol, bought_at).await?;

        tokio::time::sleep(self.config.schedule.self_test_settle).await;

        self.broker
            .submit_order(&OrderRequest::market(&symbol, 1.0, OrderSide::Sell))
            .await?;
        let sold_at = self.broker.latest_trade(&symbol).await?.price;
        self.notifier.test_sell(&symbol, sold_at).await?;

        self.state.self_test_done = true;
        info!(symbol = %symbol, bought_at, sold_at, "✅ Self-test complete");
        Ok(())
    }

    // ─── Steady-state cycle ───────────────────────────────────────────────────

    /// One polling cycle. Any error aborts the rest of the cycle; state
    /// changes already made stay.
    pub async fn cycle(&mut self) -> Result<Phase, AgentError> {
        let (now, local) = self.local_now();
        let in_window = self.config.schedule.in_trading_window(local.time());

        match decision::gate(in_window, self.state.self_test_done) {
            Some(Phase::OutsideHours) => {
                debug!(local = %local.time(), "Outside trading hours");
                self.notifier.outside_hours(local.time()).await?;
                return Ok(Phase::OutsideHours);
            }
            Some(phase) => {
                warn!(?phase, "Cycle called before startup finished — skipping");
                return Ok(phase);
            }
            None => {}
        }

        // ── Observe ───────────────────────────────────────────────────────────
        let (start, end) = clock::bar_window(now, self.config.schedule.timezone, self.config.lookback_days);
        let request = BarsRequest {
            symbol:    self.config.symbol.clone(),
            timeframe: self.config.timeframe.clone(),
            start,
            end,
            limit:     self.config.bar_limit,
        };
        let bars = self.market.bars(&request).await?;
        let snapshot = signal::evaluate(&bars, &self.config.strategy)?;

        let current_price = self.broker.latest_trade(&self.config.symbol).await?.price;
        let position = self.state.tracker.refresh(self.broker.as_ref()).await?.clone();

        // ── Decide ────────────────────────────────────────────────────────────
        let decision = decision::decide(
            &MarketView { signal: snapshot, current_price, position: &position },
            &self.config.strategy,
        );

        info!(
            symbol  = %self.config.symbol,
            phase   = ?decision.phase,
            price   = current_price,
            fast    = snapshot.fast,
            slow    = snapshot.slow,
            entry   = snapshot.entry,
            actions = decision.actions.len(),
            "🔄 Cycle evaluated"
        );

        // ── Act ───────────────────────────────────────────────────────────────
        self.execute(&decision).await?;
        self.maybe_send_report(local).await?;
        self.maybe_send_heartbeat(now, local).await?;

        Ok(decision.phase)
    }

    async fn execute(&mut self, decision: &Decision) -> Result<(), AgentError> {
        for action in &decision.actions {
            match *action {
                Action::Enter { quantity, price } => {
                    self.broker
                        .submit_order(&OrderRequest::market(&self.config.symbol, quantity, OrderSide::Buy))
                        .await?;
                    self.state.tracker.mark_opened(price, quantity);
                    self.state.stats.record_trade_opened();
                    info!(symbol = %self.config.symbol, quantity, price, "📈 Entered position");
                    self.notifier.bought(quantity, price).await?;
                }

                Action::CheckExit { entry_price, current_price, profit_target } => {
                    self.notifier.sell_check(entry_price, current_price, profit_target).await?;
                }

                Action::Exit { quantity, price, profit } => {
                    self.broker
                        .submit_order(&OrderRequest::market(&self.config.symbol, quantity, OrderSide::Sell))
                        .await?;
                    self.state.tracker.mark_closed();
                    self.state.stats.record_trade_closed(profit);
                    info!(symbol = %self.config.symbol, quantity, price, profit, "📉 Exited position");
                    self.notifier.sold(quantity, price, profit).await?;
                }
            }
        }
        Ok(())
    }

    async fn maybe_send_report(&mut self, local: DateTime<Tz>) -> Result<(), AgentError> {
        if !self.state.report.poll(local.time(), self.config.schedule.report_cutoff) {
            return Ok(());
        }

        let stats = &self.state.stats;
        info!(
            total_trades      = stats.total_trades(),
            profitable_trades = stats.profitable_trades(),
            total_profit      = stats.total_profit(),
            win_rate          = stats.compute_win_rate(),
            "📊 Sending daily report"
        );
        self.notifier.send_daily_report(local.date_naive(), stats).await?;

        self.state.stats.reset();
        self.state.report.mark_sent();
        Ok(())
    }

    async fn maybe_send_heartbeat(&mut self, now: DateTime<Utc>, local: DateTime<Tz>) -> Result<(), AgentError> {
        if !self.state.heartbeat.due(now, self.config.schedule.heartbeat_interval) {
            return Ok(());
        }
        self.notifier.heartbeat(local).await?;
        self.state.heartbeat.mark_sent(now);
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
