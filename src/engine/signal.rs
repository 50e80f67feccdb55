//! # engine::signal
//!
//! **Signal Calculator** — EMA series and the entry / exit conditions.
//!
//! ```text
//! EMA[0] = close[0]                                   (seeded by the first value)
//! EMA[t] = α·close[t] + (1 − α)·EMA[t−1],  α = 2 / (N + 1)
//!
//! entry  ⇔  fast_EMA[last] >  slow_EMA[last]
//! exit   ⇔  current_price − entry_price ≥ profit_target
//! ```

use tracing::debug;

use crate::config::StrategyParams;
use crate::error::AgentError;
use crate::models::Bar;

/// Latest point of both EMAs plus the derived entry decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSnapshot {
    pub fast:  f64,
    pub slow:  f64,
    pub entry: bool,
}

/// EMA over `values`, same length as the input. Empty in, empty out.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 2.0 / (period.max(1) as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());

    let mut iter = values.iter();
    if let Some(&first) = iter.next() {
        let mut prev = first;
        out.push(prev);
        for &v in iter {
            prev = alpha * v + (1.0 - alpha) * prev;
            out.push(prev);
        }
    }
    out
}

/// EMA of the closing prices.
pub fn ema_of_bars(bars: &[Bar], period: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    ema(&closes, period)
}

/// Strict: equal EMAs do not signal.
pub fn entry_signal(fast_last: f64, slow_last: f64) -> bool {
    fast_last > slow_last
}

/// Inclusive at the target.
pub fn exit_signal(entry_price: f64, current_price: f64, profit_target: f64) -> bool {
    current_price - entry_price >= profit_target
}

/// Computes both EMAs over the same window and evaluates the entry signal
/// on the most recent point.
///
/// Fails with [`AgentError::InsufficientData`] when the window is shorter
/// than the slow period.
pub fn evaluate(bars: &[Bar], params: &StrategyParams) -> Result<SignalSnapshot, AgentError> {
    let required = params.ema_fast.max(params.ema_slow);
    if bars.len() < required {
        return Err(AgentError::InsufficientData(format!(
            "{} bars in window, need at least {required}",
            bars.len()
        )));
    }

    let fast_series = ema_of_bars(bars, params.ema_fast);
    let slow_series = ema_of_bars(bars, params.ema_slow);

    let (Some(&fast), Some(&slow)) = (fast_series.last(), slow_series.last()) else {
        return Err(AgentError::InsufficientData("empty bar window".into()));
    };

    let snapshot = SignalSnapshot { fast, slow, entry: entry_signal(fast, slow) };
    debug!(
        bars  = bars.len(),
        fast  = snapshot.fast,
        slow  = snapshot.slow,
        entry = snapshot.entry,
        "EMA signal evaluated"
    );
    Ok(snapshot)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
