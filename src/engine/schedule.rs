//! # engine::schedule
//!
//! Once-a-day report latch and heartbeat timer.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};

// ─── Daily report ─────────────────────────────────────────────────────────────

/// `sent_today` is only ever true between the cutoff and local midnight;
/// the first cycle before the cutoff clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportState {
    sent_today: bool,
}

impl ReportState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when the report should go out now. Clears the latch before the cutoff.
    pub fn poll(&mut self, local_time: NaiveTime, cutoff: NaiveTime) -> bool {
        if local_time < cutoff {
            self.sent_today = false;
            return false;
        }
        !self.sent_today
    }

    pub fn mark_sent(&mut self) {
        self.sent_today = true;
    }

    pub fn sent_today(&self) -> bool {
        self.sent_today
    }
}

// ─── Heartbeat ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatState {
    last_sent: DateTime<Utc>,
}

impl HeartbeatState {
    /// The timer starts at process start, so the first heartbeat comes one
    /// interval later.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { last_sent: now }
    }

    pub fn due(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let elapsed = now.signed_duration_since(self.last_sent);
        elapsed.to_std().map(|e| e >= interval).unwrap_or(false)
    }

    /// Never moves backwards.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        if now > self.last_sent {
            self.last_sent = now;
        }
    }

    pub fn last_sent(&self) -> DateTime<Utc> {
        self.last_sent
    }
}
