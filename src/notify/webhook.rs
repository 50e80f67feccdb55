//! # notify::webhook — delivery to a chat webhook
//!
//! POSTs `{"content": "<message>"}`, the body Discord-style webhooks accept.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::notify::NotificationSink;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

pub struct WebhookSink {
    client:  reqwest::Client,
    url:     String,
    timeout: Duration,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, url: &str, timeout: Duration) -> Self {
        Self { client, url: url.to_string(), timeout }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn post(&self, message: &str) -> Result<(), AgentError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { content: message })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AgentError::Notification(format!("webhook unreachable: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Notification(format!("webhook rejected: HTTP {status}: {body}")));
        }

        Ok(())
    }
}

/// Used when no webhook is configured: messages only reach the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        warn!("WEBHOOK_URL not set — notifications go to the log only");
        Self
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn post(&self, message: &str) -> Result<(), AgentError> {
        info!(target: "crossover_agent::notifications", "{message}");
        Ok(())
    }
}
