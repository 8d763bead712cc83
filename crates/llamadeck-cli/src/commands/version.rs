// Display client and server version information

use llamadeck_client::{ClientConfig, ModelClient};

use super::Command;
use crate::error::CliResult;
use crate::output::OutputStyle;

pub struct VersionCommand {
    config: ClientConfig,
}

impl VersionCommand {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl Command for VersionCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        println!("{}", style.header(&format!("deck v{}", env!("CARGO_PKG_VERSION"))));

        let client = ModelClient::from_config(&self.config)?;
        let info = client.get_version().await?;
        println!("{}", style.key_value("server", &client.base_url()));
        println!("{}", style.key_value("version", &info.version));

        let details = serde_json::to_string_pretty(&info.raw)
            .unwrap_or_else(|_| info.raw.to_string());
        println!("{}", details);
        Ok(())
    }
}
