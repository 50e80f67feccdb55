//! # gateway — external collaborators
//!
//! The controller talks to the outside world only through these traits:
//!
//! ```text
//!  MarketData  ── bars(symbol, timeframe, start, end, limit)
//!  Broker      ── submit_order / latest_trade / position
//! ```
//!
//! [`alpaca::AlpacaClient`] implements both over REST; tests use in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AgentError;
use crate::models::{Bar, BrokerPosition, LatestTrade, OrderReceipt, OrderRequest};

pub mod alpaca;

/// Parameters of one historical bar query.
#[derive(Debug, Clone, PartialEq)]
pub struct BarsRequest {
    pub symbol:    String,
    pub timeframe: String,
    pub start:     NaiveDate,
    pub end:       NaiveDate,
    pub limit:     usize,
}

#[async_trait]
pub trait MarketData: Send + Sync {
    /// Chronological bars, oldest first, no repeated timestamps.
    async fn bars(&self, request: &BarsRequest) -> Result<Vec<Bar>, AgentError>;
}

#[async_trait]
pub trait Broker: Send + Sync {
    /// Market order, time in force = day.
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderReceipt, AgentError>;

    async fn latest_trade(&self, symbol: &str) -> Result<LatestTrade, AgentError>;

    /// `Err(AgentError::PositionNotFound)` when nothing is held.
    async fn position(&self, symbol: &str) -> Result<BrokerPosition, AgentError>;
}
