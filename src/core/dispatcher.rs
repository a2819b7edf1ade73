//! # Message Dispatcher
//!
//! Turns one user send into a rate-limited, debounced, cancelable webhook
//! exchange and keeps the transcript consistent with its outcome.
//!
//! ```text
//! Idle ──Send──▶ (validate) ──too long──▶ notice, Idle
//!                    │ ──rate limited──▶ notice, Idle
//!                    ▼
//!               Preparing{epoch} ──DebounceElapsed{epoch}──▶ AwaitingReply{epoch}
//!                                                                 │
//!                                         ReplyReceived{epoch} ───┘──▶ Idle
//! ```
//!
//! Every accepted send and every refresh bumps `epoch`. Timers and replies
//! carry the epoch they were issued under and are ignored once it is stale,
//! so a slow superseded reply can never overwrite a newer typing indicator.
//! Sends arriving inside the debounce window replace the queued one: only the
//! last call goes out, earlier texts stay on screen but are never delivered.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

use super::action::{Action, Effect};
use super::config::ResolvedConfig;
use super::presenter::{Presenter, TypingHandle};
use super::rate_limiter::RateLimiter;
use super::session::ConversationSession;
use super::typing::TypingIndicatorController;
use crate::transport::{TransportError, WebhookReply, WebhookRequest};

pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1_000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

pub const START_MARKER_LABEL: &str = "Today";
pub const FALLBACK_REPLY: &str =
    "I apologize, but I encountered an issue processing your message. Please try again.";
pub const TECHNICAL_DIFFICULTIES_MESSAGE: &str =
    "The chat service is experiencing technical difficulties. Please try again in a moment.";
pub const WORKFLOW_UNAVAILABLE_MESSAGE: &str = "The chat service is temporarily unavailable. \
    Please contact support directly or try again later.";
pub const RATE_LIMITED_MESSAGE: &str =
    "You're sending messages too quickly. Please wait a moment and try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    TooLong { limit: usize },
    RateLimited,
    /// The webhook reported a workflow failure inside a 2xx reply.
    Workflow(String),
    Transport(TransportError),
}

impl DispatchError {
    /// Text shown to the user, or `None` when nothing should be shown.
    pub fn user_message(&self) -> Option<String> {
        let text = match self {
            DispatchError::TooLong { limit } => {
                return Some(format!(
                    "Your message is too long. Please keep it under {limit} characters."
                ));
            }
            DispatchError::RateLimited => RATE_LIMITED_MESSAGE,
            DispatchError::Workflow(_) => WORKFLOW_UNAVAILABLE_MESSAGE,
            DispatchError::Transport(TransportError::Cancelled) => return None,
            DispatchError::Transport(TransportError::Timeout(_) | TransportError::Network(_)) => {
                TECHNICAL_DIFFICULTIES_MESSAGE
            }
            DispatchError::Transport(TransportError::Api { status, .. }) if *status >= 500 => {
                TECHNICAL_DIFFICULTIES_MESSAGE
            }
            DispatchError::Transport(_) => FALLBACK_REPLY,
        };
        Some(text.to_string())
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::TooLong { limit } => write!(f, "message exceeds {limit} characters"),
            DispatchError::RateLimited => write!(f, "rate limited"),
            DispatchError::Workflow(msg) => write!(f, "workflow error: {msg}"),
            DispatchError::Transport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Maps a settled exchange to the text to display, or the error to translate.
pub fn interpret_reply(
    result: Result<WebhookReply, TransportError>,
) -> Result<String, DispatchError> {
    let reply = result.map_err(DispatchError::Transport)?;
    if reply.is_workflow_error() {
        return Err(DispatchError::Workflow(reply.message.unwrap_or_default()));
    }
    Ok(reply.text().unwrap_or(FALLBACK_REPLY).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub max_message_chars: usize,
    pub debounce: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchState {
    Idle,
    /// Echoed and waiting out the debounce window.
    Preparing { epoch: u64, request: WebhookRequest },
    AwaitingReply { epoch: u64, typing: TypingHandle },
}

/// The exchange currently on the wire.
#[derive(Debug)]
pub struct PendingRequest {
    pub epoch: u64,
    pub message: String,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input; nothing happened.
    Ignored,
    Rejected(DispatchError),
    RateLimited,
    Queued { epoch: u64 },
}

pub struct MessageDispatcher {
    client_id: String,
    settings: DispatchSettings,
    limiter: RateLimiter,
    session: ConversationSession,
    typing: TypingIndicatorController,
    state: DispatchState,
    epoch: u64,
    pending: Option<PendingRequest>,
}

impl MessageDispatcher {
    pub fn new(client_id: String, settings: DispatchSettings, limiter: RateLimiter) -> Self {
        Self {
            session: ConversationSession::new(client_id.clone()),
            client_id,
            settings,
            limiter,
            typing: TypingIndicatorController::new(),
            state: DispatchState::Idle,
            epoch: 0,
            pending: None,
        }
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(
            config.client_id.clone(),
            config.dispatch,
            RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window),
        )
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DispatchState::Idle
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn update(&mut self, presenter: &mut dyn Presenter, action: Action) -> Effect {
        match action {
            Action::Send(text) => match self.send(presenter, &text) {
                SendOutcome::Queued { epoch } => Effect::ScheduleDispatch {
                    epoch,
                    delay: self.settings.debounce,
                },
                _ => Effect::None,
            },
            Action::DebounceElapsed { epoch } => self.dispatch(presenter, epoch),
            Action::ReplyReceived { epoch, result } => {
                self.resolve(presenter, epoch, result);
                Effect::None
            }
            Action::Refresh => {
                self.refresh(presenter);
                Effect::None
            }
            Action::Quit => {
                self.cancel_pending(presenter);
                Effect::Quit
            }
            // Open/close and focus belong to the toggle state machine.
            Action::Toggle | Action::Close | Action::FocusSettled { .. } => Effect::None,
        }
    }

    /// Validates, rate-limits and echoes `text`, then queues it behind the
    /// debounce window. Any earlier exchange is cancelled.
    pub fn send(&mut self, presenter: &mut dyn Presenter, text: &str) -> SendOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SendOutcome::Ignored;
        }

        let limit = self.settings.max_message_chars;
        if message.chars().count() > limit {
            debug!("Rejected message of {} chars", message.chars().count());
            let err = DispatchError::TooLong { limit };
            if let Some(notice) = err.user_message() {
                presenter.append_assistant_message(&notice);
            }
            return SendOutcome::Rejected(err);
        }

        if !self.limiter.try_acquire() {
            warn!("Send rejected by rate limiter");
            if let Some(notice) = DispatchError::RateLimited.user_message() {
                presenter.append_assistant_message(&notice);
            }
            return SendOutcome::RateLimited;
        }

        if self.session.ensure_started().is_new {
            presenter.append_start_marker(START_MARKER_LABEL);
        }
        presenter.append_user_message(message);
        presenter.clear_input();

        self.cancel_pending(presenter);
        self.epoch += 1;

        let session_id = self.session.id().unwrap_or_default();
        let request = WebhookRequest::new(message, &self.client_id, session_id, Utc::now());
        debug!("Queued request #{} behind debounce", self.epoch);
        self.state = DispatchState::Preparing {
            epoch: self.epoch,
            request,
        };
        SendOutcome::Queued { epoch: self.epoch }
    }

    fn dispatch(&mut self, presenter: &mut dyn Presenter, epoch: u64) -> Effect {
        if epoch != self.epoch {
            debug!("Ignoring stale debounce for request #{}", epoch);
            return Effect::None;
        }
        let request = match std::mem::replace(&mut self.state, DispatchState::Idle) {
            DispatchState::Preparing { request, .. } => request,
            other => {
                self.state = other;
                return Effect::None;
            }
        };

        let typing = self.typing.show(presenter);
        let cancel = CancellationToken::new();
        self.pending = Some(PendingRequest {
            epoch,
            message: request.message.clone(),
            cancel: cancel.clone(),
        });
        self.state = DispatchState::AwaitingReply { epoch, typing };
        info!("Dispatching request #{}", epoch);

        Effect::SpawnRequest {
            epoch,
            request,
            cancel,
        }
    }

    fn resolve(
        &mut self,
        presenter: &mut dyn Presenter,
        epoch: u64,
        result: Result<WebhookReply, TransportError>,
    ) {
        let typing = match self.state {
            DispatchState::AwaitingReply {
                epoch: current,
                typing,
            } if current == epoch => typing,
            _ => {
                debug!("Discarding stale reply for request #{}", epoch);
                return;
            }
        };
        self.state = DispatchState::Idle;
        let cancelled = self
            .pending
            .take()
            .is_some_and(|pending| pending.cancel.is_cancelled());

        if cancelled {
            info!("Request #{} was cancelled", epoch);
            self.typing.discard(presenter, typing);
            return;
        }

        match interpret_reply(result) {
            Ok(text) => self.typing.resolve(presenter, typing, &text),
            Err(err) => {
                self.typing.discard(presenter, typing);
                match err.user_message() {
                    Some(notice) => {
                        error!("Error sending message: {}", err);
                        presenter.append_assistant_message(&notice);
                    }
                    None => info!("Request #{} was cancelled", epoch),
                }
            }
        }
    }

    /// Clears the conversation: pending work, session and transcript.
    pub fn refresh(&mut self, presenter: &mut dyn Presenter) {
        self.cancel_pending(presenter);
        self.epoch += 1;
        self.session.reset();
        presenter.clear_transcript();
        self.typing.forget_all();
        presenter.focus_input();
        info!("Conversation refreshed");
    }

    fn cancel_pending(&mut self, presenter: &mut dyn Presenter) {
        if let Some(pending) = self.pending.take() {
            info!("Cancelling pending request #{}", pending.epoch);
            pending.cancel.cancel();
        }
        if let DispatchState::AwaitingReply { typing, .. } =
            std::mem::replace(&mut self.state, DispatchState::Idle)
        {
            self.typing.discard(presenter, typing);
        }
    }
}
