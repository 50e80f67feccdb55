//! # engine::stats
//!
//! **Statistics Aggregator** — intraday counters flushed by the daily report.
//!
//! Lives only in memory: a restart loses the day's numbers.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyStats {
    total_trades:      u32,
    profitable_trades: u32,
    total_profit:      f64,
}

impl DailyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// An entry fill opens a round trip.
    pub fn record_trade_opened(&mut self) {
        self.total_trades += 1;
    }

    /// An exit fill closes it. `profit` is per share.
    pub fn record_trade_closed(&mut self, profit: f64) {
        if profit > 0.0 {
            // keeps profitable <= total when the open predates this process
            self.profitable_trades += 1;
            self.total_trades = self.total_trades.max(self.profitable_trades);
        }
        self.total_profit += profit;
    }

    /// `profitable / total × 100`, or 0 with no trades.
    pub fn compute_win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.profitable_trades as f64 / self.total_trades as f64 * 100.0
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_trades(&self) -> u32 {
        self.total_trades
    }

    pub fn profitable_trades(&self) -> u32 {
        self.profitable_trades
    }

    pub fn total_profit(&self) -> f64 {
        self.total_profit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_is_zero_without_trades() {
        assert_eq!(DailyStats::new().compute_win_rate(), 0.0);
    }

    #[test]
    fn win_rate_one_in_three() {
        let mut stats = DailyStats::new();
        for _ in 0..3 {
            stats.record_trade_opened();
        }
        stats.record_trade_closed(1.5);

        let rate = stats.compute_win_rate();
        assert!((rate - 100.0 / 3.0).abs() < 1e-9, "{rate}");
        assert_eq!(format!("{rate:.2}"), "33.33");
    }

    #[test]
    fn only_positive_profit_counts_as_profitable() {
        let mut stats = DailyStats::new();
        stats.record_trade_opened();
        stats.record_trade_opened();
        stats.record_trade_closed(0.0);
        stats.record_trade_closed(-0.5);

        assert_eq!(stats.profitable_trades(), 0);
        assert_eq!(stats.total_trades(), 2);
        assert_eq!(stats.total_profit(), -0.5);
    }

    #[test]
    fn close_does_not_double_count_round_trip() {
        let mut stats = DailyStats::new();
        stats.record_trade_opened();
        stats.record_trade_closed(2.0);
        assert_eq!(stats.total_trades(), 1);
        assert_eq!(stats.profitable_trades(), 1);
        assert_eq!(stats.compute_win_rate(), 100.0);
    }

    #[test]
    fn profitable_never_exceeds_total() {
        let mut stats = DailyStats::new();
        stats.record_trade_closed(2.0);
        assert!(stats.profitable_trades() <= stats.total_trades());
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut stats = DailyStats::new();
        stats.record_trade_opened();
        stats.record_trade_closed(3.0);
        stats.reset();
        assert_eq!(stats, DailyStats::new());
    }
}
