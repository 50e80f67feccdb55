//! # models::position
//!
//! The agent's view of its position in the traded symbol.
//!
//! `entry_price` is the single source of the open/closed state, so
//! "`is_open` iff `entry_price` is set" cannot be broken by construction.

use serde::Serialize;

use crate::models::order::BrokerPosition;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    symbol:      String,
    entry_price: Option<f64>,
    quantity:    f64,
}

impl Position {
    /// No holding.
    pub fn flat(symbol: &str) -> Self {
        Self { symbol: symbol.to_string(), entry_price: None, quantity: 0.0 }
    }

    pub fn open(symbol: &str, entry_price: f64, quantity: f64) -> Self {
        Self { symbol: symbol.to_string(), entry_price: Some(entry_price), quantity }
    }

    pub fn from_broker(symbol: &str, broker: BrokerPosition) -> Self {
        Self::open(symbol, broker.avg_entry_price, broker.quantity)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_open(&self) -> bool {
        self.entry_price.is_some()
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Drop back to flat after an exit fill.
    pub fn clear(&mut self) {
        self.entry_price = None;
        self.quantity = 0.0;
    }
}
