//! # Actions
//!
//! Everything that can happen to a widget becomes an `Action`.
//! User presses Enter? That's `Action::Send(text)`.
//! Webhook answers? That's `Action::ReplyReceived { epoch, result }`.
//!
//! The dispatcher's `update()` takes an action, mutates its own state and the
//! presenter synchronously, and returns an `Effect` describing the deferred
//! work (timers, network) the runtime must start. Deferred work reports back
//! as another action.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::transport::{TransportError, WebhookReply, WebhookRequest};

#[derive(Debug)]
pub enum Action {
    /// Raw text from the input field.
    Send(String),
    /// The debounce timer started for `epoch` fired.
    DebounceElapsed { epoch: u64 },
    /// The exchange started for `epoch` settled.
    ReplyReceived {
        epoch: u64,
        result: Result<WebhookReply, TransportError>,
    },
    /// User-initiated conversation reset.
    Refresh,
    Toggle,
    /// Close if open (Escape).
    Close,
    /// A focus timer issued under `generation` fired.
    FocusSettled { generation: u64 },
    Quit,
}

#[derive(Debug)]
pub enum Effect {
    None,
    /// Fire `DebounceElapsed { epoch }` after `delay`.
    ScheduleDispatch { epoch: u64, delay: Duration },
    /// Run the exchange and fire `ReplyReceived { epoch, .. }` when it settles.
    SpawnRequest {
        epoch: u64,
        request: WebhookRequest,
        cancel: CancellationToken,
    },
    /// Fire `FocusSettled { generation }` after `delay`.
    ScheduleFocus { generation: u64, delay: Duration },
    Quit,
}
