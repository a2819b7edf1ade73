//! # Typing Indicator
//!
//! Tracks the "assistant is composing" placeholders the dispatcher has put on
//! screen. A placeholder ends one of two ways: promoted in place to the reply,
//! or discarded. Discarding twice is harmless.

use std::collections::HashSet;

use log::debug;

use super::presenter::{Presenter, TypingHandle};

#[derive(Debug, Default)]
pub struct TypingIndicatorController {
    next_id: u64,
    live: HashSet<TypingHandle>,
}

impl TypingIndicatorController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, presenter: &mut dyn Presenter) -> TypingHandle {
        self.next_id += 1;
        let handle = TypingHandle(self.next_id);
        presenter.show_typing_placeholder(handle);
        self.live.insert(handle);
        handle
    }

    /// Promotes the placeholder to a real assistant message. If the node is
    /// gone, the message is appended instead so the reply is never lost.
    pub fn resolve(&mut self, presenter: &mut dyn Presenter, handle: TypingHandle, text: &str) {
        let was_live = self.live.remove(&handle);
        if !(was_live && presenter.resolve_typing_placeholder(handle, text)) {
            debug!("Typing placeholder {:?} missing, appending reply", handle);
            presenter.append_assistant_message(text);
        }
    }

    pub fn discard(&mut self, presenter: &mut dyn Presenter, handle: TypingHandle) {
        if self.live.remove(&handle) {
            presenter.remove_typing_placeholder(handle);
        }
    }

    /// Forgets every placeholder without touching the presenter. Used after
    /// the transcript has been cleared wholesale.
    pub fn forget_all(&mut self) {
        self.live.clear();
    }

    pub fn is_live(&self, handle: TypingHandle) -> bool {
        self.live.contains(&handle)
    }
}
