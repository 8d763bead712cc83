// List installed models

use llamadeck_client::{ClientConfig, ModelClient};

use super::Command;
use crate::error::CliResult;
use crate::output::OutputStyle;
use crate::progress::create_spinner;

pub struct ListCommand {
    config: ClientConfig,
}

impl ListCommand {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl Command for ListCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let client = ModelClient::from_config(&self.config)?;

        let spinner = create_spinner(&format!("Listing models at {}", client.endpoint()));
        let result = client.list_models().await;
        spinner.finish_and_clear();

        let models = result?;
        if models.is_empty() {
            println!("{}", style.info("No models found"));
        } else {
            println!("{}", style.model_table(&models));
        }
        Ok(())
    }
}
