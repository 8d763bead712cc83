// Delete an installed model

use std::io::Write;

use llamadeck_client::{ClientConfig, ModelClient};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::Command;
use crate::error::{CliError, CliResult};
use crate::output::OutputStyle;

pub struct RmCommand {
    config: ClientConfig,
    model: String,
    assume_yes: bool,
}

impl RmCommand {
    pub fn new(config: ClientConfig, model: String) -> Self {
        Self {
            config,
            model,
            assume_yes: false,
        }
    }

    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    async fn confirm(&self, style: &OutputStyle) -> CliResult<bool> {
        print!("{}", style.prompt(&format!("Delete model '{}'? [y/N]", self.model)));
        std::io::stdout().flush()?;

        let mut answer = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut answer)
            .await?;
        Ok(is_yes(&answer))
    }
}

/// Accepts `y` or `yes` in any case
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait::async_trait]
impl Command for RmCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let client = ModelClient::from_config(&self.config)?;

        if !self.assume_yes && !self.confirm(&style).await? {
            return Err(CliError::Aborted);
        }

        client.delete_model(&self.model).await?;
        println!("{}", style.success(&format!("Deleted {}", self.model)));
        Ok(())
    }
}
