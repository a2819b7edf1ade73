use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{WebhookReply, WebhookRequest};

/// Errors that can occur during a webhook exchange.
/// Variants carry enough info to determine retryability.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Network-level failure (DNS, connection refused, reset). Retryable.
    Network(String),
    /// The attempt did not settle within the configured timeout. Retryable.
    Timeout(Duration),
    /// The webhook answered with a non-2xx status. Retryable if status >= 500.
    Api { status: u16, message: String },
    /// The 2xx body was not a decodable reply. Not retryable.
    Parse(String),
    /// The caller abandoned the exchange. Not retryable, never surfaced.
    Cancelled,
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) | TransportError::Timeout(_) => true,
            TransportError::Api { status, .. } => *status >= 500,
            TransportError::Parse(_) | TransportError::Cancelled => false,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Timeout(after) => {
                write!(f, "request timed out after {}ms", after.as_millis())
            }
            TransportError::Api { status, message } => {
                write!(f, "webhook error (HTTP {status}): {message}")
            }
            TransportError::Parse(msg) => write!(f, "parse error: {msg}"),
            TransportError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for TransportError {}

/// A single attempt at delivering one message to the webhook.
///
/// Implementations perform exactly one network call. Timeouts, retries and
/// cancellation are layered on top by [`super::RetryingTransport`], which
/// abandons an attempt by dropping the returned future.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Returns the name of the transport (used in logs).
    fn name(&self) -> &str;

    async fn send(&self, request: &WebhookRequest) -> Result<WebhookReply, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = TransportError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_retryable());
        assert!(TransportError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(TransportError::Network("connection reset".to_string()).is_retryable());
    }

    #[test]
    fn test_client_errors_and_cancellation_are_final() {
        let err = TransportError::Api {
            status: 404,
            message: "not found".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!TransportError::Parse("eof".to_string()).is_retryable());
        assert!(!TransportError::Cancelled.is_retryable());
    }

    #[test]
    fn test_display_includes_status() {
        let err = TransportError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "webhook error (HTTP 500): boom");
    }
}
