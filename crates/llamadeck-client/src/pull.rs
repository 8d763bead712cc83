//! Pull progress aggregation
//!
//! A pull streams status events for a manifest fetch, one or more layer
//! downloads, then verification and cleanup. [`PullAggregator`] folds those
//! events into a single overall percentage:
//!
//! | status contains            | phase           | percent              |
//! |----------------------------|-----------------|----------------------|
//! | `pulling manifest`         | FetchingManifest| reset to 0           |
//! | `pulling` (with a digest)  | Downloading     | bytes, capped at 95  |
//! | `verifying sha256 digest`  | Verifying       | 96                   |
//! | `writing manifest`         | WritingManifest | 97                   |
//! | `removing unused layers`   | Cleaning        | 98                   |
//! | `success`                  | Complete        | 100                  |
//!
//! Apart from the manifest reset, the percentage never goes backwards within
//! one pull, so a layer appearing late (and growing the known total) holds the
//! bar rather than rewinding it.

use tracing::debug;

use crate::{
    error::ClientError,
    models::{LayerProgress, PullPhase, PullProgress, StreamEvent},
    Result,
};

/// Ceiling for the byte-derived percentage; the last points belong to the
/// post-download phases.
pub const DOWNLOAD_PERCENT_CAP: f64 = 95.0;

/// Map a server status string to a pull phase.
///
/// The server's wording is the compatibility contract, so every substring
/// lives here. Order matters: `pulling manifest` also contains `pulling`.
pub fn classify_status(status: &str) -> Option<PullPhase> {
    if status.contains("pulling manifest") {
        Some(PullPhase::FetchingManifest)
    } else if status.contains("pulling") {
        Some(PullPhase::Downloading)
    } else if status.contains("verifying sha256 digest") {
        Some(PullPhase::Verifying)
    } else if status.contains("writing manifest") {
        Some(PullPhase::WritingManifest)
    } else if status.contains("removing unused layers") {
        Some(PullPhase::Cleaning)
    } else if status.contains("success") {
        Some(PullPhase::Complete)
    } else {
        None
    }
}

/// Per-pull state. One instance per pull operation; never shared.
#[derive(Debug, Clone)]
pub struct PullAggregator {
    phase: PullPhase,
    percent: f64,
    layers: Vec<LayerProgress>,
    total_bytes: u64,
    downloaded_bytes: u64,
}

impl Default for PullAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl PullAggregator {
    pub fn new() -> Self {
        Self {
            phase: PullPhase::Starting,
            percent: 0.0,
            layers: Vec::new(),
            total_bytes: 0,
            downloaded_bytes: 0,
        }
    }

    /// Fold one event into the state.
    ///
    /// Returns the new snapshot when the event changed anything observable,
    /// `None` for events that do not drive progress (unknown status, a
    /// `pulling` event without a digest). An in-band `error` field fails the
    /// pull with `RemoteOperationFailed`.
    pub fn apply(&mut self, event: &StreamEvent) -> Result<Option<PullProgress>> {
        if let Some(message) = &event.error {
            return Err(ClientError::RemoteOperationFailed(message.clone()));
        }

        let phase = match classify_status(&event.status) {
            Some(phase) => phase,
            None => {
                debug!("Ignoring pull status: {:?}", event.status);
                return Ok(None);
            }
        };

        let candidate = match phase {
            PullPhase::Downloading => match self.record_layer(event) {
                Some(percent) => percent,
                None => return Ok(None),
            },
            PullPhase::Starting | PullPhase::FetchingManifest => 0.0,
            PullPhase::Verifying => 96.0,
            PullPhase::WritingManifest => 97.0,
            PullPhase::Cleaning => 98.0,
            PullPhase::Complete => 100.0,
        };

        self.phase = phase;
        self.percent = if phase == PullPhase::FetchingManifest {
            0.0
        } else {
            self.percent.max(candidate)
        };
        Ok(Some(self.snapshot()))
    }

    /// Update counters for a layer event; returns the byte-derived percent,
    /// or `None` if the event carries no digest.
    fn record_layer(&mut self, event: &StreamEvent) -> Option<f64> {
        let digest = event.digest.as_deref().filter(|d| !d.is_empty())?;
        let completed = event.completed.unwrap_or(0);

        match self.layers.iter_mut().find(|l| l.digest == digest) {
            Some(layer) => layer.completed_bytes = completed,
            None => {
                // A layer's total counts once, at first sighting
                let total = event.total.unwrap_or(0);
                self.total_bytes = self.total_bytes.saturating_add(total);
                self.layers.push(LayerProgress {
                    digest: digest.to_string(),
                    total_bytes: total,
                    completed_bytes: completed,
                });
            }
        }

        // Counts come from the server; clamp rather than wrap
        self.downloaded_bytes = self
            .layers
            .iter()
            .map(|l| l.completed_bytes)
            .fold(0u64, u64::saturating_add);

        if self.total_bytes > 0 {
            let ratio = self.downloaded_bytes as f64 / self.total_bytes as f64 * 100.0;
            Some(ratio.min(DOWNLOAD_PERCENT_CAP))
        } else {
            Some(self.percent)
        }
    }

    /// Current observable state
    pub fn snapshot(&self) -> PullProgress {
        PullProgress {
            phase: self.phase,
            percent: self.percent,
            downloaded_bytes: self.downloaded_bytes,
            total_bytes: self.total_bytes,
        }
    }

    pub fn phase(&self) -> PullPhase {
        self.phase
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Layers in order of first sighting
    pub fn layers(&self) -> &[LayerProgress] {
        &self.layers
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded_bytes
    }

    /// Check byte accounting once the stream has closed.
    ///
    /// Measured bytes win over the server's own `success` status: a pull that
    /// saw fewer bytes than the layers declared is incomplete regardless of
    /// the final status.
    pub fn check_complete(&self) -> Result<()> {
        if self.total_bytes > 0 && self.downloaded_bytes < self.total_bytes {
            return Err(ClientError::IncompleteTransfer {
                downloaded: self.downloaded_bytes,
                total: self.total_bytes,
            });
        }
        Ok(())
    }
}

/// Receives pull progress snapshots
pub trait PullObserver {
    fn on_progress(&mut self, progress: &PullProgress);
}

impl<F> PullObserver for F
where
    F: FnMut(&PullProgress),
{
    fn on_progress(&mut self, progress: &PullProgress) {
        self(progress)
    }
}
