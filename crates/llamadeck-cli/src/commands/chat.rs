// Interactive chat against the selected model

use std::io::Write;

use llamadeck_client::{AppState, ChatObserver, ChatTranscriptEntry, ClientConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::{Command, InterruptGuard};
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputStyle};

/// Line typed to leave the REPL
pub const EXIT_COMMAND: &str = "/exit";

/// Chat with a model, once or in a loop
pub struct ChatCommand {
    pub config: ClientConfig,
    pub message: Option<String>,
    pub model: Option<String>,
}

impl ChatCommand {
    pub fn new(config: ClientConfig, message: Option<String>, model: Option<String>) -> Self {
        Self {
            config,
            message,
            model,
        }
    }

    /// Build the session state and pick the model to talk to
    async fn prepare_state(&self) -> AppState {
        let mut state = AppState::new(self.config.clone());
        match &self.model {
            Some(model) => state.select_model(model.clone()),
            None => {
                if let Err(e) = state.refresh_models().await {
                    output::print_warning(&format!(
                        "Could not list models ({}), using {}",
                        e,
                        state.selected_model()
                    ));
                }
            }
        }
        state
    }

    async fn exchange(state: &mut AppState, prompt: &str) -> CliResult<()> {
        let interrupt = InterruptGuard::install();
        let mut printer = StdoutPrinter::default();
        let result = state
            .send_message(prompt, interrupt.token(), &mut printer)
            .await;
        interrupt.release().await;
        result?;
        Ok(())
    }

    async fn repl(state: &mut AppState) -> CliResult<()> {
        let style = OutputStyle::default();
        println!(
            "{}",
            style.info(&format!(
                "Chatting with {}. Type {} or press Ctrl-D or Ctrl-C to quit.",
                state.selected_model(),
                EXIT_COMMAND
            ))
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}", style.prompt(">>>"));
            std::io::stdout().flush()?;

            // Ctrl-C at the prompt quits; during an exchange it cancels
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    debug!("Interrupt at prompt, leaving chat");
                    break;
                }
            };
            let line = match line {
                Some(line) => line,
                None => break,
            };
            let prompt = line.trim();
            if prompt == EXIT_COMMAND {
                break;
            }
            if prompt.is_empty() {
                continue;
            }

            // A failed exchange is reported and the session carries on
            if let Err(e) = Self::exchange(state, prompt).await {
                println!();
                output::print_error(&e.user_message());
            }
        }

        debug!("Chat ended after {} exchanges", state.history().len());
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for ChatCommand {
    async fn execute(&self) -> CliResult<()> {
        let mut state = self.prepare_state().await;

        match &self.message {
            Some(message) => {
                if message.trim().is_empty() {
                    return Err(CliError::InvalidArgument {
                        message: "Message cannot be empty".to_string(),
                    });
                }
                Self::exchange(&mut state, message).await
            }
            None => Self::repl(&mut state).await,
        }
    }
}

/// Writes fragments to stdout as they arrive
#[derive(Default)]
struct StdoutPrinter {
    failed: bool,
}

impl ChatObserver for StdoutPrinter {
    fn on_fragment(&mut self, fragment: &str) {
        let mut stdout = std::io::stdout().lock();
        if write!(stdout, "{}", fragment).and_then(|_| stdout.flush()).is_err() && !self.failed {
            self.failed = true;
            debug!("stdout closed while streaming");
        }
    }

    fn on_complete(&mut self, entry: &ChatTranscriptEntry) {
        if entry.ai_text.is_empty() {
            println!("(no response)");
        } else {
            println!();
        }
    }
}
