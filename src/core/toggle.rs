//! # Toggle State
//!
//! Open/closed state of the widget and where focus goes after a flip.
//!
//! ```text
//! Closed ──toggle──▶ Open    focus input after 200ms (only if still open)
//! Open   ──toggle──▶ Closed  focus toggle button now
//! ```

use std::time::Duration;

use log::debug;

use crate::DisplayMode;

/// Time for the open animation to settle before the input takes focus.
pub const FOCUS_SETTLE_DELAY: Duration = Duration::from_millis(200);
/// Delay before focusing a widget that starts open.
pub const INITIAL_FOCUS_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Closed,
    Open,
}

/// Where focus should land after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequest {
    /// Focus the input once `after` has elapsed, if `generation` is still current.
    Input { after: Duration, generation: u64 },
    /// Focus the toggle affordance immediately.
    Toggle,
}

#[derive(Debug)]
pub struct ToggleStateMachine {
    state: ToggleState,
    /// Bumped on every transition so stale focus timers can be recognised.
    generation: u64,
}

impl ToggleStateMachine {
    /// Embedded mode and auto-open start the widget open, without animation.
    pub fn new(auto_open: bool, mode: DisplayMode) -> Self {
        let state = if auto_open || mode == DisplayMode::Embedded {
            ToggleState::Open
        } else {
            ToggleState::Closed
        };
        Self {
            state,
            generation: 0,
        }
    }

    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ToggleState::Open
    }

    /// Focus request for a widget that was constructed open.
    pub fn initial_focus(&self) -> Option<FocusRequest> {
        self.is_open().then_some(FocusRequest::Input {
            after: INITIAL_FOCUS_DELAY,
            generation: self.generation,
        })
    }

    pub fn toggle(&mut self) -> FocusRequest {
        self.generation += 1;
        self.state = match self.state {
            ToggleState::Closed => ToggleState::Open,
            ToggleState::Open => ToggleState::Closed,
        };
        debug!("Widget toggled to {:?}", self.state);

        match self.state {
            ToggleState::Open => FocusRequest::Input {
                after: FOCUS_SETTLE_DELAY,
                generation: self.generation,
            },
            ToggleState::Closed => FocusRequest::Toggle,
        }
    }

    /// True if a focus timer issued under `generation` should still act.
    pub fn focus_is_current(&self, generation: u64) -> bool {
        self.is_open() && generation == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_closed_by_default() {
        let toggle = ToggleStateMachine::new(false, DisplayMode::Floating);
        assert_eq!(toggle.state(), ToggleState::Closed);
        assert_eq!(toggle.initial_focus(), None);
    }

    #[test]
    fn test_auto_open_and_embedded_start_open() {
        assert!(ToggleStateMachine::new(true, DisplayMode::Floating).is_open());

        let embedded = ToggleStateMachine::new(false, DisplayMode::Embedded);
        assert!(embedded.is_open());
        assert_eq!(
            embedded.initial_focus(),
            Some(FocusRequest::Input {
                after: INITIAL_FOCUS_DELAY,
                generation: 0
            })
        );
    }

    #[test]
    fn test_open_schedules_input_focus_close_focuses_toggle() {
        let mut toggle = ToggleStateMachine::new(false, DisplayMode::Floating);

        let open = toggle.toggle();
        assert!(toggle.is_open());
        assert_eq!(
            open,
            FocusRequest::Input {
                after: FOCUS_SETTLE_DELAY,
                generation: 1
            }
        );

        assert_eq!(toggle.toggle(), FocusRequest::Toggle);
        assert!(!toggle.is_open());
    }

    #[test]
    fn test_stale_focus_timer_is_ignored() {
        let mut toggle = ToggleStateMachine::new(false, DisplayMode::Floating);
        let FocusRequest::Input { generation, .. } = toggle.toggle() else {
            panic!("opening should request input focus");
        };
        assert!(toggle.focus_is_current(generation));

        toggle.toggle(); // close
        assert!(!toggle.focus_is_current(generation));
        toggle.toggle(); // reopen
        assert!(!toggle.focus_is_current(generation));
    }
}
