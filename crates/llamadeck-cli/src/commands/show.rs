// Check that the server can describe a model

use llamadeck_client::{ClientConfig, ModelClient};

use super::Command;
use crate::error::CliResult;
use crate::output::OutputStyle;

pub struct ShowCommand {
    config: ClientConfig,
    model: String,
}

impl ShowCommand {
    pub fn new(config: ClientConfig, model: String) -> Self {
        Self { config, model }
    }
}

#[async_trait::async_trait]
impl Command for ShowCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let client = ModelClient::from_config(&self.config)?;
        client.verify(&self.model).await?;
        println!("{}", style.success(&format!("{} is installed and readable", self.model)));
        Ok(())
    }
}
