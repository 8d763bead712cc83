// LlamaDeck CLI entry point

use anyhow::{Context, Result};
use llamadeck_cli::{output, router::CommandRouter};

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;

    if let Err(e) = runtime.block_on(CommandRouter::route()) {
        output::print_error(&e.user_message());
        tracing::debug!("{}", e.technical_details());
        std::process::exit(1);
    }
    Ok(())
}
