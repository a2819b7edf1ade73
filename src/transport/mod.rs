pub mod http;
pub mod retry;
pub mod types;
pub mod webhook;

pub use http::HttpTransport;
pub use retry::{RetryPolicy, RetryingTransport};
pub use types::{WebhookReply, WebhookRequest, html_escape};
pub use webhook::{TransportError, WebhookTransport};
