//! # models::bar
//!
//! Defines [`Bar`], one OHLCV interval returned by the market data provider.
//!
//! Bars are transient: the controller fetches a fresh window every cycle and
//! drops it once the EMAs are computed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single aggregated price interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Interval open time (UTC).
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "o")]
    pub open: f64,

    #[serde(rename = "h")]
    pub high: f64,

    #[serde(rename = "l")]
    pub low: f64,

    /// The only field the signal calculator reads.
    #[serde(rename = "c")]
    pub close: f64,

    /// Shares traded in the interval.
    #[serde(rename = "v")]
    pub volume: f64,
}

/// Puts bars in chronological order and drops repeated timestamps, keeping
/// the first occurrence.
pub fn normalize(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}
