// LlamaDeck CLI Library

pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod router;

pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use router::{Cli, CommandRouter, Commands};
