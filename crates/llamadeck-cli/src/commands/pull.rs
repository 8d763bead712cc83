// Download a model with a live progress bar

use llamadeck_client::{ClientConfig, ModelClient};

use super::{Command, InterruptGuard};
use crate::error::CliResult;
use crate::output::OutputStyle;
use crate::progress::PullProgressBar;

pub struct PullCommand {
    config: ClientConfig,
    model: String,
    quiet: bool,
}

impl PullCommand {
    pub fn new(config: ClientConfig, model: String) -> Self {
        Self {
            config,
            model,
            quiet: false,
        }
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

#[async_trait::async_trait]
impl Command for PullCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let client = ModelClient::from_config(&self.config)?;
        let interrupt = InterruptGuard::install();

        let mut bar = if self.quiet {
            PullProgressBar::hidden(&self.model)
        } else {
            PullProgressBar::new(&self.model)
        };

        let result = client
            .pull_model(&self.model, interrupt.token(), &mut bar)
            .await;
        interrupt.release().await;

        match result {
            Ok(outcome) => {
                bar.finish();
                println!(
                    "{}",
                    style.success(&format!(
                        "Pulled {} ({} of {} kB in {} layers)",
                        outcome.model,
                        outcome.downloaded_bytes / 1024,
                        outcome.total_bytes / 1024,
                        outcome.layers
                    ))
                );
                Ok(())
            }
            Err(e) => {
                bar.abandon();
                Err(e.into())
            }
        }
    }
}
