//! # Conversation Session
//!
//! Owns the session identifier sent with every webhook call. The id is
//! created lazily on the first accepted send and lives until an explicit
//! refresh.
//!
//! Id format: `{client_id}_session_{epoch_millis}_{9 base36 chars}`.

use chrono::{DateTime, Utc};
use log::{debug, info};

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub started: bool,
}

/// Result of [`ConversationSession::ensure_started`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStart {
    /// True only for the call that created the session; callers emit the
    /// one-time start marker on it.
    pub is_new: bool,
}

#[derive(Debug)]
pub struct ConversationSession {
    client_id: String,
    current: Option<Session>,
}

impl ConversationSession {
    pub fn new(client_id: String) -> Self {
        Self {
            client_id,
            current: None,
        }
    }

    pub fn ensure_started(&mut self) -> SessionStart {
        self.ensure_started_at(Utc::now())
    }

    pub fn ensure_started_at(&mut self, now: DateTime<Utc>) -> SessionStart {
        if self.current.is_some() {
            return SessionStart { is_new: false };
        }
        let id = generate_session_id(&self.client_id, now);
        info!("Started conversation session {}", id);
        self.current = Some(Session {
            id,
            started_at: now,
            started: true,
        });
        SessionStart { is_new: true }
    }

    /// Forgets the current session. Only an explicit refresh calls this.
    pub fn reset(&mut self) {
        if let Some(session) = self.current.take() {
            debug!("Reset conversation session {}", session.id);
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.id.as_str())
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// Builds a fresh session id for `client_id` at `now`.
pub fn generate_session_id(client_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}_session_{}_{}",
        client_id,
        now.timestamp_millis(),
        random_base36(SUFFIX_LEN)
    )
}

/// `len` random lowercase base36 characters drawn from a v4 UUID.
fn random_base36(len: usize) -> String {
    let mut bits = uuid::Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(BASE36[(bits % 36) as usize] as char);
        bits /= 36;
    }
    out
}
