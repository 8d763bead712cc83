// Progress indicators for pulls and slow requests

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use llamadeck_client::{PullObserver, PullProgress};

/// Create a spinner for long-running operations
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|e| {
            eprintln!("Failed to create spinner template: {}", e);
            ProgressStyle::default_spinner()
        });
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Percent bar fed by pull progress snapshots
pub struct PullProgressBar {
    bar: ProgressBar,
}

impl PullProgressBar {
    pub fn new(model: &str) -> Self {
        Self::with_bar(ProgressBar::new(100), model)
    }

    /// A bar that draws nothing, for quiet mode and tests
    pub fn hidden(model: &str) -> Self {
        Self::with_bar(ProgressBar::hidden(), model)
    }

    fn with_bar(bar: ProgressBar, model: &str) -> Self {
        bar.set_length(100);
        let style = ProgressStyle::default_bar()
            .template("{prefix} {msg:<20} [{bar:40.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|e| {
                eprintln!("Failed to create progress bar template: {}", e);
                ProgressStyle::default_bar()
            })
            .progress_chars("=>-");
        bar.set_style(style);
        bar.set_prefix(model.to_string());
        bar.set_message("connecting");
        Self { bar }
    }

    /// Position currently shown, in percent
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    /// Stop drawing and leave the last state on screen
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl PullObserver for PullProgressBar {
    fn on_progress(&mut self, progress: &PullProgress) {
        self.bar.set_message(progress.phase.label());
        self.bar.set_position(progress.percent.round() as u64);
    }
}
