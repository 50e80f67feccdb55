//! # engine::decision
//!
//! Pure per-cycle state machine. No I/O happens here: the controller gathers
//! observations, asks for a [`Decision`], then executes its [`Action`]s in order.
//!
//! ```text
//!                 ┌──────────────┐ outside window
//!   every cycle ─▶│ OutsideHours │◀──────────────────┐
//!                 └──────────────┘                   │
//!                        │ in window                 │
//!                        ▼                           │
//!                 ┌──────────────┐ once per process  │
//!                 │   SelfTest   │───────────────────┤
//!                 └──────────────┘                   │
//!                        ▼                           │
//!     ┌────────────┐  entry signal ┌─────────────────┐
//!     │ NoPosition │──────────────▶│ HoldingPosition │
//!     └────────────┘◀──────────────└─────────────────┘
//!                     profit target
//! ```
//!
//! States are re-derived from the clock and the broker every cycle rather than stored.

use serde::Serialize;

use crate::config::StrategyParams;
use crate::engine::signal::{exit_signal, SignalSnapshot};
use crate::models::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    OutsideHours,
    SelfTest,
    NoPosition,
    HoldingPosition,
}

/// What the controller should do next, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Market buy of `quantity` at roughly `price`.
    Enter { quantity: f64, price: f64 },
    /// Diagnostic notice of the evaluated sell condition.
    CheckExit { entry_price: f64, current_price: f64, profit_target: f64 },
    /// Market sell of the held `quantity`; `profit` is per share.
    Exit { quantity: f64, price: f64, profit: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub phase:   Phase,
    pub actions: Vec<Action>,
}

/// Everything a trading cycle observed before deciding.
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub signal:        SignalSnapshot,
    pub current_price: f64,
    pub position:      &'a Position,
}

/// Phases decided before any market I/O. `None` = go on and trade.
pub fn gate(in_trading_window: bool, self_test_done: bool) -> Option<Phase> {
    if !in_trading_window {
        Some(Phase::OutsideHours)
    } else if !self_test_done {
        Some(Phase::SelfTest)
    } else {
        None
    }
}

/// Entry / exit decision for one cycle.
pub fn decide(view: &MarketView<'_>, params: &StrategyParams) -> Decision {
    match view.position.entry_price() {
        None => {
            let actions = if view.signal.entry {
                vec![Action::Enter { quantity: params.trade_qty, price: view.current_price }]
            } else {
                Vec::new()
            };
            Decision { phase: Phase::NoPosition, actions }
        }

        Some(entry_price) => {
            let mut actions = vec![Action::CheckExit {
                entry_price,
                current_price: view.current_price,
                profit_target: params.profit_target,
            }];

            if exit_signal(entry_price, view.current_price, params.profit_target) {
                let held = view.position.quantity();
                actions.push(Action::Exit {
                    quantity: if held > 0.0 { held } else { params.trade_qty },
                    price:    view.current_price,
                    profit:   view.current_price - entry_price,
                });
            }
            Decision { phase: Phase::HoldingPosition, actions }
        }
    }
}
