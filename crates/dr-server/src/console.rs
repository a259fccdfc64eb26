//! Line-oriented operator console.
//!
//! `help`, `quit` and `exit` are handled locally; every other non-empty
//! line is relayed to all connected agents.

use std::io::Write as _;
use std::sync::Arc;

use dr_protocol::CommandEnvelope;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::display::{section, separator, timestamp};
use crate::ws::broadcast::{broadcast, BroadcastReport};
use crate::AppState;

const PROMPT: &str = ">>> ";

/// How the console loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// Operator asked to stop the process.
    Quit,
    /// Input stream closed; the relay keeps serving.
    EndOfInput,
}

/// One parsed operator line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand<'a> {
    Empty,
    Help,
    Quit,
    Relay(&'a str),
}

impl<'a> ConsoleCommand<'a> {
    /// Commands are case-sensitive and matched after trimming.
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            text => Self::Relay(text),
        }
    }
}

pub fn help_text() -> String {
    format!(
        "{}  help          - Show this help\n  quit/exit     - Exit the server\n  Any other text will be sent to connected agents{}",
        section("Available Commands"),
        section(""),
    )
}

pub struct OperatorConsole {
    state: Arc<AppState>,
}

impl OperatorConsole {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Read and act on operator lines until `quit`/`exit` or end of input.
    pub async fn run<R>(&self, mut input: R) -> ConsoleExit
    where
        R: AsyncBufRead + Unpin,
    {
        tracing::info!("Command line interface started");
        println!("{}", separator("COMMAND LINE INTERFACE"));
        println!("CLI ready at {}. Type 'help' for available commands.", timestamp());
        println!("{}", separator(""));

        let mut buf = Vec::new();
        loop {
            print!("{PROMPT}");
            let _ = std::io::stdout().flush();

            buf.clear();
            match input.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    tracing::info!("Operator input closed; console stopped");
                    return ConsoleExit::EndOfInput;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read operator input; console stopped");
                    return ConsoleExit::EndOfInput;
                }
            }
            // Invalid UTF-8 is replaced, not fatal.
            let line = String::from_utf8_lossy(&buf);

            match ConsoleCommand::parse(&line) {
                ConsoleCommand::Empty => {}
                ConsoleCommand::Help => {
                    tracing::info!("Help command executed");
                    println!("{}", help_text());
                }
                ConsoleCommand::Quit => {
                    tracing::info!("Shutdown requested by operator");
                    return ConsoleExit::Quit;
                }
                ConsoleCommand::Relay(text) => {
                    self.relay(text);
                }
            }
        }
    }

    /// Broadcast one line of operator text. Returns `None` if the payload
    /// could not be built.
    pub fn relay(&self, text: &str) -> Option<BroadcastReport> {
        tracing::info!(command = %text, "Sending command to agents");
        let payload = if self.state.config.console.wrap_commands {
            match CommandEnvelope::new(text, Value::Null).to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode command envelope");
                    return None;
                }
            }
        } else {
            text.to_string()
        };
        Some(broadcast(&self.state.registry, &payload))
    }
}
