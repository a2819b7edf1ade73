use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::core::action::Action;

/// Maps one line of console input to an action. Slash commands control the
/// widget; anything else is a message.
pub fn parse_line(line: &str) -> Action {
    match line.trim() {
        "/toggle" => Action::Toggle,
        "/close" => Action::Close,
        "/refresh" => Action::Refresh,
        "/quit" | "/exit" => Action::Quit,
        _ => Action::Send(line.to_string()),
    }
}

/// Forwards stdin lines to the widget until EOF, then asks it to quit.
pub fn spawn_stdin_reader(tx: UnboundedSender<Action>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let action = parse_line(&line);
                    debug!("Input: {:?}", action);
                    if tx.send(action).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    let _ = tx.send(Action::Quit);
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    let _ = tx.send(Action::Quit);
                    break;
                }
            }
        }
    })
}
