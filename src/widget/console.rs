//! Line-oriented presenter for terminals. A terminal can't rewrite earlier
//! lines, so a promoted placeholder is printed as a new bubble below the
//! "typing" line.

use std::collections::HashSet;
use std::io::Write;

use log::{debug, warn};

use crate::core::presenter::{Presenter, TypingHandle};

const DEFAULT_WIDTH: usize = 80;
const USER_LABEL: &str = "you";

pub struct ConsolePresenter<W: Write> {
    out: W,
    assistant_name: String,
    width: usize,
    typing: HashSet<TypingHandle>,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W, assistant_name: String) -> Self {
        Self {
            out,
            assistant_name,
            width: DEFAULT_WIDTH,
            typing: HashSet::new(),
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            warn!("Failed to write to console: {}", e);
        }
    }

    fn bubble(&mut self, speaker: &str, text: &str) {
        let prefix = format!("{speaker} > ");
        let indent = " ".repeat(prefix.chars().count());
        let options = textwrap::Options::new(self.width)
            .initial_indent(&prefix)
            .subsequent_indent(&indent);
        let wrapped = textwrap::fill(text, options);
        self.line(&wrapped);
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn append_user_message(&mut self, text: &str) {
        self.bubble(USER_LABEL, text);
    }

    fn append_assistant_message(&mut self, html: &str) {
        let name = self.assistant_name.clone();
        self.bubble(&name, html);
    }

    fn append_start_marker(&mut self, label: &str) {
        self.line(&format!("-- {label} --"));
    }

    fn show_typing_placeholder(&mut self, handle: TypingHandle) {
        self.typing.insert(handle);
        let text = format!("{} is typing...", self.assistant_name);
        self.line(&text);
    }

    fn resolve_typing_placeholder(&mut self, handle: TypingHandle, html: &str) -> bool {
        if !self.typing.remove(&handle) {
            return false;
        }
        self.append_assistant_message(html);
        true
    }

    fn remove_typing_placeholder(&mut self, handle: TypingHandle) -> bool {
        self.typing.remove(&handle)
    }

    fn clear_input(&mut self) {
        // The terminal consumed the line already.
    }

    fn clear_transcript(&mut self) {
        self.typing.clear();
        self.line("-- conversation cleared --");
    }

    fn focus_input(&mut self) {
        debug!("Focus: input");
    }

    fn focus_toggle(&mut self) {
        debug!("Focus: toggle");
    }

    fn set_expanded(&mut self, expanded: bool) {
        if expanded {
            self.line(&format!("[{} chat opened]", self.assistant_name));
        } else {
            self.line(&format!("[{} chat closed]", self.assistant_name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(presenter: ConsolePresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_renders_conversation() {
        let mut console = ConsolePresenter::new(Vec::new(), "Support".to_string());
        console.append_start_marker("Today");
        console.append_user_message("Hello");
        console.show_typing_placeholder(TypingHandle(1));
        assert!(console.resolve_typing_placeholder(TypingHandle(1), "Hi there"));

        assert_eq!(
            output(console),
            "-- Today --\nyou > Hello\nSupport is typing...\nSupport > Hi there\n"
        );
    }

    #[test]
    fn test_wraps_long_bubbles_with_hanging_indent() {
        let mut console = ConsolePresenter::new(Vec::new(), "Bot".to_string()).with_width(20);
        console.append_assistant_message("one two three four five six");

        assert_eq!(output(console), "Bot > one two three\n      four five six\n");
    }

    #[test]
    fn test_removed_placeholder_cannot_be_resolved() {
        let mut console = ConsolePresenter::new(Vec::new(), "Support".to_string());
        console.show_typing_placeholder(TypingHandle(3));
        assert!(console.remove_typing_placeholder(TypingHandle(3)));
        assert!(!console.remove_typing_placeholder(TypingHandle(3)));
        assert!(!console.resolve_typing_placeholder(TypingHandle(3), "late"));
        assert_eq!(output(console), "Support is typing...\n");
    }
}
