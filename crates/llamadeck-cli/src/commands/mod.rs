// Command handlers for the deck CLI

pub mod chat;
pub mod list;
pub mod pull;
pub mod rm;
pub mod show;
pub mod version;

pub use chat::ChatCommand;
pub use list::ListCommand;
pub use pull::PullCommand;
pub use rm::RmCommand;
pub use show::ShowCommand;
pub use version::VersionCommand;

use llamadeck_client::CancellationToken;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::CliResult;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Cancels one operation on Ctrl-C.
///
/// The signal watcher lives only as long as the guard: release it when the
/// operation ends so a later interrupt does not reach a finished token.
pub struct InterruptGuard {
    token: CancellationToken,
    done: CancellationToken,
    watcher: Option<JoinHandle<()>>,
}

impl InterruptGuard {
    /// Start watching for Ctrl-C
    pub fn install() -> Self {
        let token = CancellationToken::new();
        let done = CancellationToken::new();
        let trigger = token.clone();
        let stop = done.clone();

        let watcher = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {}
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() {
                        debug!("Interrupt received, cancelling");
                        trigger.cancel();
                    }
                }
            }
        });

        Self {
            token,
            done,
            watcher: Some(watcher),
        }
    }

    /// Token cancelled by the first Ctrl-C while the guard is held
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stop watching and wait for the watcher task to exit
    pub async fn release(mut self) {
        self.done.cancel();
        if let Some(watcher) = self.watcher.take() {
            if let Err(e) = watcher.await {
                debug!("Interrupt watcher ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.done.cancel();
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}
