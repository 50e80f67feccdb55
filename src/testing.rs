//! In-memory gateways, sink and clock for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};

use crate::clock::Clock;
use crate::config::{AlpacaConfig, Config, Schedule, StrategyParams};
use crate::error::AgentError;
use crate::gateway::{BarsRequest, Broker, MarketData};
use crate::models::{Bar, BrokerPosition, LatestTrade, OrderReceipt, OrderRequest, OrderSide};
use crate::notify::NotificationSink;

pub const SYMBOL: &str = "SPY";

// ─── Builders ─────────────────────────────────────────────────────────────────

pub fn params(ema_fast: usize, ema_slow: usize, profit_target: f64) -> StrategyParams {
    StrategyParams { ema_fast, ema_slow, profit_target, trade_qty: 2.0 }
}

/// One bar per minute starting 2024-03-01 14:30 UTC.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: base + chrono::Duration::minutes(i as i64),
            open:      close,
            high:      close + 0.5,
            low:       close - 0.5,
            close,
            volume:    1_000.0,
        })
        .collect()
}

pub fn config() -> Config {
    Config {
        alpaca: AlpacaConfig {
            api_key:         "key".into(),
            api_secret:      "secret".into(),
            base_url:        "http://127.0.0.1:9".into(),
            data_url:        "http://127.0.0.1:9".into(),
            request_timeout: Duration::from_secs(1),
            dry_run:         false,
        },
        symbol:    SYMBOL.into(),
        timeframe: "1Min".into(),
        strategy:  params(3, 10, 2.0),
        schedule:  Schedule {
            timezone:           chrono_tz::US::Eastern,
            trading_start:      NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            trading_end:        NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
            report_cutoff:      NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            poll_interval:      Duration::from_secs(60),
            heartbeat_interval: Duration::from_secs(300),
            error_cooldown:     Duration::from_secs(30),
            self_test_settle:   Duration::ZERO,
        },
        test_symbol:        "T".into(),
        lookback_days:      31,
        bar_limit:          10_000,
        failure_escalation: 3,
        webhook_url:        None,
    }
}

/// New York wall-clock time on a given March 2024 day (EST, UTC−5).
pub fn ny(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    chrono_tz::US::Eastern
        .with_ymd_and_hms(2024, 3, day, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

// ─── Clock ────────────────────────────────────────────────────────────────────

pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

// ─── Market data ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeMarket {
    bars:     Mutex<Vec<Bar>>,
    requests: Mutex<Vec<BarsRequest>>,
}

impl FakeMarket {
    pub fn with_closes(closes: &[f64]) -> Self {
        let market = Self::default();
        market.set_closes(closes);
        market
    }

    pub fn set_closes(&self, closes: &[f64]) {
        *self.bars.lock().unwrap() = bars_from_closes(closes);
    }

    pub fn requests(&self) -> Vec<BarsRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.bars.lock().unwrap().clone())
    }
}

// ─── Broker ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Holding {
    Held(BrokerPosition),
    Fail(u16, String),
}

/// Fills every order at the symbol's current price and keeps its own positions.
#[derive(Default)]
pub struct FakeBroker {
    prices:          Mutex<HashMap<String, f64>>,
    holdings:        Mutex<HashMap<String, Holding>>,
    orders:          Mutex<Vec<OrderRequest>>,
    fail_next_order: Mutex<Option<String>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }

    /// Overrides the next position answers for [`SYMBOL`].
    pub fn set_position(&self, answer: Result<BrokerPosition, AgentError>) {
        let mut holdings = self.holdings.lock().unwrap();
        match answer {
            Ok(held) => {
                holdings.insert(SYMBOL.to_string(), Holding::Held(held));
            }
            Err(AgentError::PositionNotFound(_)) => {
                holdings.remove(SYMBOL);
            }
            Err(AgentError::Gateway { status, message }) => {
                holdings.insert(SYMBOL.to_string(), Holding::Fail(status, message));
            }
            Err(other) => {
                holdings.insert(SYMBOL.to_string(), Holding::Fail(500, other.to_string()));
            }
        }
    }

    pub fn fail_next_order(&self, message: &str) {
        *self.fail_next_order.lock().unwrap() = Some(message.to_string());
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().unwrap().clone()
    }

    pub fn orders_for(&self, symbol: &str) -> Vec<OrderRequest> {
        self.orders().into_iter().filter(|o| o.symbol == symbol).collect()
    }
}

#[async_trait]
impl Broker for FakeBroker {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, AgentError> {
        if let Some(message) = self.fail_next_order.lock().unwrap().take() {
            return Err(AgentError::Gateway { status: 403, message });
        }

        let price = self.prices.lock().unwrap().get(&order.symbol).copied().unwrap_or(1.0);
        {
            let mut holdings = self.holdings.lock().unwrap();
            match order.side {
                OrderSide::Buy => {
                    holdings.insert(
                        order.symbol.clone(),
                        Holding::Held(BrokerPosition { avg_entry_price: price, quantity: order.quantity }),
                    );
                }
                OrderSide::Sell => {
                    holdings.remove(&order.symbol);
                }
            }
        }

        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        Ok(OrderReceipt {
            order_id:        format!("fake-{}", orders.len()),
            client_order_id: order.client_order_id,
            status:          "accepted".into(),
        })
    }

    async fn latest_trade(&self, symbol: &str) -> Result<LatestTrade, AgentError> {
        self.prices
            .lock()
            .unwrap()
            .get(symbol)
            .map(|&price| LatestTrade { price })
            .ok_or_else(|| AgentError::Network(format!("no quote for {symbol}")))
    }

    async fn position(&self, symbol: &str) -> Result<BrokerPosition, AgentError> {
        match self.holdings.lock().unwrap().get(symbol).cloned() {
            Some(Holding::Held(held)) => Ok(held),
            Some(Holding::Fail(status, message)) => Err(AgentError::Gateway { status, message }),
            None => Err(AgentError::PositionNotFound(symbol.to_string())),
        }
    }
}

// ─── Notification sink ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<String>>,
    failing:  Mutex<bool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.messages().iter().filter(|m| m.contains(needle)).count()
    }

    pub fn clear(&self) {
        self.messages.lock().unwrap().clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn post(&self, message: &str) -> Result<(), AgentError> {
        if *self.failing.lock().unwrap() {
            return Err(AgentError::Notification("sink down".into()));
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Shared handles to every fake behind one controller.
pub struct Rig {
    pub market: Arc<FakeMarket>,
    pub broker: Arc<FakeBroker>,
    pub sink:   Arc<RecordingSink>,
    pub clock:  Arc<ManualClock>,
}

impl Rig {
    pub fn new(now: DateTime<Utc>, closes: &[f64]) -> Self {
        Self {
            market: Arc::new(FakeMarket::with_closes(closes)),
            broker: Arc::new(FakeBroker::new()),
            sink:   Arc::new(RecordingSink::new()),
            clock:  Arc::new(ManualClock::at(now)),
        }
    }
}
