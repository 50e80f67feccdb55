//! # engine::position
//!
//! **Position Tracker** — mirrors the broker's record of the traded symbol.
//!
//! Every cycle starts from the broker's answer; the in-memory snapshot only
//! carries local changes (entry / exit fills) until the next refresh.

use tracing::debug;

use crate::error::AgentError;
use crate::gateway::Broker;
use crate::models::Position;

#[derive(Debug, Clone)]
pub struct PositionTracker {
    position: Position,
}

impl PositionTracker {
    pub fn new(symbol: &str) -> Self {
        Self { position: Position::flat(symbol) }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Re-derives the position from the broker.
    ///
    /// "No position" becomes a flat snapshot; any other gateway error is
    /// returned and the snapshot is left untouched.
    pub async fn refresh(&mut self, broker: &dyn Broker) -> Result<&Position, AgentError> {
        let symbol = self.position.symbol().to_string();

        self.position = match broker.position(&symbol).await {
            Ok(held) => Position::from_broker(&symbol, held),
            Err(e) if e.is_not_found() => Position::flat(&symbol),
            Err(e) => return Err(e),
        };

        debug!(
            symbol      = %symbol,
            is_open     = self.position.is_open(),
            entry_price = ?self.position.entry_price(),
            quantity    = self.position.quantity(),
            "Position refreshed"
        );
        Ok(&self.position)
    }

    /// Local view right after an entry fill.
    pub fn mark_opened(&mut self, entry_price: f64, quantity: f64) {
        let symbol = self.position.symbol().to_string();
        self.position = Position::open(&symbol, entry_price, quantity);
    }

    /// Local view right after an exit fill.
    pub fn mark_closed(&mut self) {
        self.position.clear();
    }
}
