// Log subscriber setup

use tracing::Level;

/// Max log level for the given flags. Quiet wins over verbose.
pub fn level_for(verbose: bool, quiet: bool) -> Level {
    if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    }
}

/// Install the global subscriber. Logs go to stderr so they never interleave
/// with streamed chat text on stdout. A second call is a no-op.
pub fn init_logging(verbose: bool, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
