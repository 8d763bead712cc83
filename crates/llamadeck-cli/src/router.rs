// Command routing and dispatch

use clap::{Parser, Subcommand};
use llamadeck_client::ClientConfig;
use tracing::debug;

use crate::commands::*;
use crate::error::CliResult;

/// deck - manage and chat with models on a local Ollama server
#[derive(Parser, Debug)]
#[command(name = "deck")]
#[command(bin_name = "deck")]
#[command(about = "Manage and chat with models on a local Ollama server")]
#[command(version)]
#[command(author = "LlamaDeck Contributors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server host: IP, hostname, host:port or URL
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    pub port: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List installed models
    #[command(alias = "ls")]
    List,

    /// Download a model
    Pull {
        /// Model name, e.g. mistral:latest
        #[arg(value_name = "MODEL")]
        name: String,
    },

    /// Delete an installed model
    Rm {
        /// Model name
        #[arg(value_name = "MODEL")]
        name: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check that a model is installed and readable
    Show {
        /// Model name
        #[arg(value_name = "MODEL")]
        name: String,
    },

    /// Show client and server version
    Version,

    /// Chat with a model (interactive when no message is given)
    Chat {
        /// Message to send
        #[arg(value_name = "MESSAGE")]
        message: Option<String>,

        /// Model to use instead of the first installed one
        #[arg(short, long)]
        model: Option<String>,
    },
}

pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();
        crate::logging::init_logging(cli.verbose, cli.quiet);
        Self::execute(&cli).await
    }

    /// Configuration from files and environment, with flags applied on top
    pub fn resolve_config(cli: &Cli) -> CliResult<ClientConfig> {
        let mut config = ClientConfig::load_with_precedence()?;
        Self::apply_overrides(&mut config, cli);
        config.validate()?;
        debug!("Using server {}", config.endpoint());
        Ok(config)
    }

    /// Apply `--host`/`--port` over the loaded configuration
    pub fn apply_overrides(config: &mut ClientConfig, cli: &Cli) {
        if let Some(host) = &cli.host {
            config.host = host.clone();
        }
        if let Some(port) = &cli.port {
            config.port = port.clone();
        }
    }

    /// Execute a command
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let config = Self::resolve_config(cli)?;

        match &cli.command {
            Commands::List => ListCommand::new(config).execute().await,
            Commands::Pull { name } => {
                PullCommand::new(config, name.clone())
                    .with_quiet(cli.quiet)
                    .execute()
                    .await
            }
            Commands::Rm { name, yes } => {
                RmCommand::new(config, name.clone())
                    .with_assume_yes(*yes)
                    .execute()
                    .await
            }
            Commands::Show { name } => ShowCommand::new(config, name.clone()).execute().await,
            Commands::Version => VersionCommand::new(config).execute().await,
            Commands::Chat { message, model } => {
                ChatCommand::new(config, message.clone(), model.clone())
                    .execute()
                    .await
            }
        }
    }
}
