//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use crate::core::config::ResolvedConfig;
use crate::transport::{TransportError, WebhookReply, WebhookRequest, WebhookTransport};

/// What a scripted call does once its delay has elapsed.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// 2xx with this JSON body.
    Reply(serde_json::Value),
    /// Non-2xx with this status.
    Status(u16),
    /// Never settles.
    Hang,
}

/// One recorded call to [`ScriptedTransport::send`].
#[derive(Debug, Clone)]
pub struct ScriptedCall {
    pub message: String,
    pub session_id: String,
    pub at: Instant,
}

/// A transport that replays queued outcomes in order and records every call.
/// Once the script runs out it answers `{"output": "ok"}`.
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<(Duration, Scripted)>>,
    calls: Mutex<Vec<ScriptedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, step: Scripted) -> Self {
        self.then_after(Duration::ZERO, step)
    }

    pub fn then_after(self, delay: Duration, step: Scripted) -> Self {
        self.steps.lock().unwrap().push_back((delay, step));
        self
    }

    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.message).collect()
    }
}

#[async_trait]
impl WebhookTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: &WebhookRequest) -> Result<WebhookReply, TransportError> {
        self.calls.lock().unwrap().push(ScriptedCall {
            message: request.message.clone(),
            session_id: request.session_id.clone(),
            at: Instant::now(),
        });
        let next = self.steps.lock().unwrap().pop_front();
        let (delay, step) =
            next.unwrap_or((Duration::ZERO, Scripted::Reply(serde_json::json!({"output": "ok"}))));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match step {
            Scripted::Reply(body) => {
                serde_json::from_value(body).map_err(|e| TransportError::Parse(e.to_string()))
            }
            Scripted::Status(status) => Err(TransportError::Api {
                status,
                message: "scripted failure".to_string(),
            }),
            Scripted::Hang => std::future::pending().await,
        }
    }
}

/// A request as the dispatcher would build it for `text`.
pub fn test_request(text: &str) -> WebhookRequest {
    WebhookRequest::new(text, "acme", "acme_session_0_test", Utc::now())
}

/// Resolved config for client `acme` with every other setting at its default.
pub fn test_config() -> ResolvedConfig {
    ResolvedConfig::with_defaults("acme".to_string(), "https://hooks.example.test/chat".to_string())
}
