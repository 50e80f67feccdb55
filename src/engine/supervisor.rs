//! # engine::supervisor
//!
//! Keeps the controller alive forever.
//!
//! ```text
//! startup:  until self-test done → sleep poll (outside hours) | cooldown (error)
//! steady:   cycle → Ok  → sleep poll
//!                 → Err → one error notification → sleep cooldown
//! ```
//!
//! No cycle error ends the process. Identical failures in a row are counted;
//! once the streak reaches the configured threshold the log level goes up and
//! the notification says how many times it happened.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::engine::controller::Controller;
use crate::engine::decision::Phase;
use crate::error::AgentError;

// ─── Failure streak ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureStreak {
    last:  Option<String>,
    count: u32,
}

impl FailureStreak {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts `description`; a different failure restarts the streak at 1.
    pub fn record(&mut self, description: &str) -> u32 {
        if self.last.as_deref() == Some(description) {
            self.count += 1;
        } else {
            self.last = Some(description.to_string());
            self.count = 1;
        }
        self.count
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

// ─── Supervisor ───────────────────────────────────────────────────────────────

pub struct Supervisor {
    controller: Controller,
    streak:     FailureStreak,
}

impl Supervisor {
    pub fn new(controller: Controller) -> Self {
        Self { controller, streak: FailureStreak::new() }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn streak(&self) -> &FailureStreak {
        &self.streak
    }

    /// Runs until the task is cancelled.
    pub async fn run(&mut self) {
        info!("🛫 Waiting for the self-test window");
        while let Some(pause) = self.startup_step().await {
            tokio::time::sleep(pause).await;
        }

        info!("🔁 Entering trading loop");
        loop {
            let pause = self.tick().await;
            tokio::time::sleep(pause).await;
        }
    }

    /// One startup attempt. `None` once the self-test has completed; the
    /// first steady cycle then runs without a pause.
    pub async fn startup_step(&mut self) -> Option<Duration> {
        let schedule = &self.controller.config().schedule;
        let (poll, cooldown) = (schedule.poll_interval, schedule.error_cooldown);

        match self.controller.startup().await {
            Ok(Phase::OutsideHours) => {
                self.streak.reset();
                Some(poll)
            }
            Ok(_) => {
                self.streak.reset();
                None
            }
            Err(e) => {
                self.report_failure("Self-test", &e).await;
                Some(cooldown)
            }
        }
    }

    /// One steady-state cycle. Returns how long to sleep before the next one.
    pub async fn tick(&mut self) -> Duration {
        let schedule = &self.controller.config().schedule;
        let (poll, cooldown) = (schedule.poll_interval, schedule.error_cooldown);

        match self.controller.cycle().await {
            Ok(phase) => {
                self.streak.reset();
                info!(?phase, sleep = ?poll, "💤 Cycle complete");
                poll
            }
            Err(e) => {
                self.report_failure("Cycle", &e).await;
                cooldown
            }
        }
    }

    /// Logs the failure and sends exactly one error notification for it.
    /// A failure to deliver that notification is only logged.
    async fn report_failure(&mut self, stage: &str, err: &AgentError) {
        let description = err.to_string();
        let count = self.streak.record(&description);
        let threshold = self.controller.config().failure_escalation;

        let message = if threshold > 0 && count >= threshold {
            error!(stage, error = %err, repeated = count, "🚨 Failure keeps repeating");
            format!("{description} (repeated {count} times)")
        } else {
            warn!(stage, error = %err, "❌ Failed — will retry after cooldown");
            description
        };

        if let Err(notify_err) = self.controller.notifier().error(&message).await {
            error!(error = %notify_err, "Could not deliver error notification");
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
