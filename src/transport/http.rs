//! reqwest-backed webhook transport.
//!
//! One call = one POST. No timeout is configured on the client itself;
//! [`super::RetryingTransport`] owns timeouts so it can tell them apart from
//! user cancellation.

use async_trait::async_trait;
use log::{debug, error, info};

use super::types::{WebhookReply, WebhookRequest};
use super::webhook::{TransportError, WebhookTransport};

pub struct HttpTransport {
    webhook_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport that POSTs to `webhook_url`.
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, request: &WebhookRequest) -> Result<WebhookReply, TransportError> {
        let json_body = serde_json::to_string(request)
            .map_err(|e| TransportError::Parse(format!("Request serialization failed: {e}")))?;
        info!("Webhook request for session {}", request.session_id);
        debug!("Raw webhook request: {}", json_body);

        let response = self
            .client
            .post(&self.webhook_url)
            .header("Content-Type", "application/json")
            .header("X-Client-ID", &request.client_id)
            .header("X-Session-ID", &request.session_id)
            .body(json_body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        debug!("Webhook response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(
                "HTTP {}: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                err_body
            );
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: err_body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!("Raw webhook reply: {}", body);

        serde_json::from_str(&body).map_err(|e| TransportError::Parse(e.to_string()))
    }
}
