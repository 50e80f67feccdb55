//! # error
//!
//! Centralised runtime error type.
//!
//! Every gateway call, notification and cycle step returns
//! `Result<_, AgentError>`. The supervisor turns any of these into a single
//! notification and keeps the loop alive; only startup configuration errors
//! (reported through `anyhow`) stop the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// The broker holds no position in the symbol. Expected; the position
    /// tracker normalises it to "flat".
    #[error("Position not found: {0}")]
    PositionNotFound(String),

    /// The gateway answered with a non-success HTTP status.
    #[error("Gateway error {status}: {message}")]
    Gateway { status: u16, message: String },

    /// A network call exceeded its per-call timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Transport-level failure (DNS, connection reset, TLS, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// The gateway answered 2xx but the body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Not enough bars to seed the slow EMA.
    #[error("Insufficient market data: {0}")]
    InsufficientData(String),

    /// The notification sink rejected or failed to deliver a message.
    #[error("Notification failed: {0}")]
    Notification(String),
}

impl AgentError {
    /// `true` for the broker's "no such position" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentError::PositionNotFound(_))
    }

    /// Maps a `reqwest` failure, keeping timeouts distinct from other transport errors.
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AgentError::Timeout(format!("{context}: {err}"))
        } else if err.is_decode() {
            AgentError::InvalidResponse(format!("{context}: {err}"))
        } else {
            AgentError::Network(format!("{context}: {err}"))
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
