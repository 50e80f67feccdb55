//! # models::order
//!
//! Order, fill and quote types exchanged with the broker gateway.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── OrderSide ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy  => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

// ─── OrderRequest ─────────────────────────────────────────────────────────────

/// Immediate market order, good for the day. No other order types exist.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol:          String,
    pub quantity:        f64,
    pub side:            OrderSide,
    /// Idempotency key sent to the broker
    pub client_order_id: Uuid,
}

impl OrderRequest {
    pub fn market(symbol: &str, quantity: f64, side: OrderSide) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity,
            side,
            client_order_id: Uuid::new_v4(),
        }
    }
}

// ─── Broker answers ───────────────────────────────────────────────────────────

/// Handle returned by the broker once an order is accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub order_id:        String,
    pub client_order_id: Uuid,
    pub status:          String,
}

/// Last trade print for a symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestTrade {
    pub price: f64,
}

/// The broker's authoritative record of an open position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrokerPosition {
    pub avg_entry_price: f64,
    pub quantity:        f64,
}
