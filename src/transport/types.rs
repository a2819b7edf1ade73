use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Substring the webhook places in `message` when its workflow failed,
/// even though the HTTP status is 2xx.
pub const WORKFLOW_ERROR_SENTINEL: &str = "Error in workflow";

/// The JSON body POSTed to the webhook. Session and client ids are also
/// sent as `X-Session-ID` / `X-Client-ID` headers.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    /// HTML-escaped user text.
    pub message: String,
    pub client_id: String,
    pub session_id: String,
    /// ISO-8601 send time.
    pub timestamp: String,
}

impl WebhookRequest {
    /// Builds a request for raw user text, escaping it for transmission.
    pub fn new(text: &str, client_id: &str, session_id: &str, sent_at: DateTime<Utc>) -> Self {
        Self {
            message: html_escape(text),
            client_id: client_id.to_string(),
            session_id: session_id.to_string(),
            timestamp: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Reply body. Any of the three text fields may carry the assistant's answer.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WebhookReply {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl WebhookReply {
    /// First non-empty of `output`, `response`, `message`.
    pub fn text(&self) -> Option<&str> {
        [&self.output, &self.response, &self.message]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|text| !text.is_empty())
    }

    /// True when the webhook reported a workflow failure inside a 2xx body.
    pub fn is_workflow_error(&self) -> bool {
        self.message
            .as_deref()
            .is_some_and(|m| m.contains(WORKFLOW_ERROR_SENTINEL))
    }
}

/// Escape HTML special characters so user text is inert on the receiving side.
pub fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
