//! # Presenter
//!
//! The presentation surface the core drives. The core never renders; it
//! calls these methods and the front end decides what they look like.
//!
//! [`Transcript`] is an in-memory implementation used for headless
//! embedding and tests.

/// Identifies one typing placeholder in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypingHandle(pub u64);

pub trait Presenter {
    fn append_user_message(&mut self, text: &str);
    fn append_assistant_message(&mut self, html: &str);
    /// One-time marker emitted when a conversation starts (e.g. a date separator).
    fn append_start_marker(&mut self, label: &str);
    fn show_typing_placeholder(&mut self, handle: TypingHandle);
    /// Turns the placeholder into a regular assistant message in place.
    /// Returns false if the placeholder is no longer present.
    fn resolve_typing_placeholder(&mut self, handle: TypingHandle, html: &str) -> bool;
    /// Returns false if the placeholder is no longer present.
    fn remove_typing_placeholder(&mut self, handle: TypingHandle) -> bool;
    fn clear_input(&mut self);
    fn clear_transcript(&mut self);
    fn focus_input(&mut self);
    fn focus_toggle(&mut self);
    /// Mirrors the toggle's expanded flag (ARIA `aria-expanded` on the web).
    fn set_expanded(&mut self, expanded: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    User(String),
    Assistant(String),
    StartMarker(String),
    Typing(TypingHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    None,
    Input,
    Toggle,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    pub entries: Vec<Entry>,
    pub expanded: bool,
    pub focus: Focus,
    /// Times the input field was cleared after an accepted send.
    pub input_clears: usize,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            expanded: false,
            focus: Focus::None,
            input_clears: 0,
        }
    }

    pub fn user_messages(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::User(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn assistant_messages(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Assistant(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_typing(&self) -> bool {
        self.entries.iter().any(|e| matches!(e, Entry::Typing(_)))
    }

    fn position_of(&self, handle: TypingHandle) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| *e == Entry::Typing(handle))
    }
}

impl Presenter for Transcript {
    fn append_user_message(&mut self, text: &str) {
        self.entries.push(Entry::User(text.to_string()));
    }

    fn append_assistant_message(&mut self, html: &str) {
        self.entries.push(Entry::Assistant(html.to_string()));
    }

    fn append_start_marker(&mut self, label: &str) {
        self.entries.push(Entry::StartMarker(label.to_string()));
    }

    fn show_typing_placeholder(&mut self, handle: TypingHandle) {
        self.entries.push(Entry::Typing(handle));
    }

    fn resolve_typing_placeholder(&mut self, handle: TypingHandle, html: &str) -> bool {
        match self.position_of(handle) {
            Some(idx) => {
                self.entries[idx] = Entry::Assistant(html.to_string());
                true
            }
            None => false,
        }
    }

    fn remove_typing_placeholder(&mut self, handle: TypingHandle) -> bool {
        match self.position_of(handle) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    fn clear_input(&mut self) {
        self.input_clears += 1;
    }

    fn clear_transcript(&mut self) {
        self.entries.clear();
    }

    fn focus_input(&mut self) {
        self.focus = Focus::Input;
    }

    fn focus_toggle(&mut self) {
        self.focus = Focus::Toggle;
    }

    fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_replaces_in_place() {
        let mut t = Transcript::new();
        t.append_user_message("Hello");
        t.show_typing_placeholder(TypingHandle(1));
        t.append_user_message("later");

        assert!(t.resolve_typing_placeholder(TypingHandle(1), "Hi there"));
        assert_eq!(
            t.entries,
            vec![
                Entry::User("Hello".to_string()),
                Entry::Assistant("Hi there".to_string()),
                Entry::User("later".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_placeholder_reports_false() {
        let mut t = Transcript::new();
        assert!(!t.resolve_typing_placeholder(TypingHandle(7), "x"));
        assert!(!t.remove_typing_placeholder(TypingHandle(7)));
        assert!(t.entries.is_empty());
    }
}
