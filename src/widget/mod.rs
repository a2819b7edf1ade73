//! # Widget Runtime
//!
//! Owns one dispatcher, one toggle state machine and one presenter, and turns
//! the `Effect`s returned by the core into cooperative tokio tasks. Those
//! tasks report back through the action channel, so every state change still
//! happens inside [`Widget::apply`], one action at a time.
//!
//! ```text
//!  stdin / host ──Action──▶ ┌────────┐ ──Effect──▶ spawn(timer | exchange)
//!                           │ Widget │                     │
//!          ◀──presenter──── └────────┘ ◀──────Action───────┘
//! ```

mod console;
mod event;

pub use console::ConsolePresenter;
pub use event::{parse_line, spawn_stdin_reader};

use log::{debug, info};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::action::{Action, Effect};
use crate::core::config::ResolvedConfig;
use crate::core::dispatcher::MessageDispatcher;
use crate::core::presenter::Presenter;
use crate::core::toggle::{FocusRequest, ToggleStateMachine};
use crate::transport::{HttpTransport, RetryingTransport, WebhookTransport};

pub struct Widget<P: Presenter> {
    dispatcher: MessageDispatcher,
    toggle: ToggleStateMachine,
    transport: Arc<RetryingTransport>,
    presenter: P,
    tx: UnboundedSender<Action>,
    rx: UnboundedReceiver<Action>,
}

impl<P: Presenter> Widget<P> {
    /// Builds a widget around `transport`. Must be called inside a tokio
    /// runtime: a widget that starts open schedules its initial focus here.
    pub fn new(config: &ResolvedConfig, transport: Arc<dyn WebhookTransport>, mut presenter: P) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let toggle = ToggleStateMachine::new(config.auto_open, config.display_mode);
        presenter.set_expanded(toggle.is_open());

        let widget = Self {
            dispatcher: MessageDispatcher::from_config(config),
            transport: Arc::new(RetryingTransport::new(transport, config.retry)),
            toggle,
            presenter,
            tx,
            rx,
        };
        if let Some(FocusRequest::Input { after, generation }) = widget.toggle.initial_focus() {
            widget.execute(Effect::ScheduleFocus {
                generation,
                delay: after,
            });
        }
        widget
    }

    /// Handle for feeding actions from other tasks (input readers, hosts).
    pub fn sender(&self) -> UnboundedSender<Action> {
        self.tx.clone()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    pub fn toggle_state(&self) -> &ToggleStateMachine {
        &self.toggle
    }

    /// Applies one action. Returns false once the widget should shut down.
    pub fn apply(&mut self, action: Action) -> bool {
        let effect = match action {
            Action::Toggle => self.flip(),
            Action::Close if self.toggle.is_open() => self.flip(),
            Action::Close => Effect::None,
            Action::FocusSettled { generation } => {
                if self.toggle.focus_is_current(generation) {
                    self.presenter.focus_input();
                } else {
                    debug!("Ignoring stale focus timer {}", generation);
                }
                Effect::None
            }
            other => self.dispatcher.update(&mut self.presenter, other),
        };
        self.execute(effect)
    }

    /// Waits for the next action and applies it.
    pub async fn step(&mut self) -> bool {
        match self.rx.recv().await {
            Some(action) => self.apply(action),
            None => false,
        }
    }

    /// Processes actions until no send is queued or in flight.
    pub async fn settle(&mut self) {
        while !self.dispatcher.is_idle() {
            if !self.step().await {
                break;
            }
        }
    }

    fn flip(&mut self) -> Effect {
        let request = self.toggle.toggle();
        self.presenter.set_expanded(self.toggle.is_open());
        match request {
            FocusRequest::Toggle => {
                self.presenter.focus_toggle();
                Effect::None
            }
            FocusRequest::Input { after, generation } => Effect::ScheduleFocus {
                generation,
                delay: after,
            },
        }
    }

    fn execute(&self, effect: Effect) -> bool {
        match effect {
            Effect::None => {}
            Effect::ScheduleDispatch { epoch, delay } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Action::DebounceElapsed { epoch });
                });
            }
            Effect::SpawnRequest {
                epoch,
                request,
                cancel,
            } => {
                let tx = self.tx.clone();
                let transport = self.transport.clone();
                tokio::spawn(async move {
                    let result = transport.execute(&request, &cancel).await;
                    let _ = tx.send(Action::ReplyReceived { epoch, result });
                });
            }
            Effect::ScheduleFocus { generation, delay } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Action::FocusSettled { generation });
                });
            }
            Effect::Quit => return false,
        }
        true
    }
}

/// Runs the console widget against the configured webhook until stdin closes
/// or the user quits.
pub async fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let transport: Arc<dyn WebhookTransport> =
        Arc::new(HttpTransport::new(config.webhook_url.clone()));
    let presenter = ConsolePresenter::new(std::io::stdout(), config.client_name.clone());
    let mut widget = Widget::new(&config, transport, presenter);

    spawn_stdin_reader(widget.sender());
    info!(
        "Chat widget running for client {} ({:?})",
        config.client_id, config.display_mode
    );

    while widget.step().await {}

    info!("Chat widget shutting down");
    Ok(())
}
