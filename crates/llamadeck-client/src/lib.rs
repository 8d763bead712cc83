//! LlamaDeck client core
//!
//! Streaming client for a local Ollama model server. It lists, pulls, deletes
//! and verifies models, and streams completions, turning the server's
//! newline-delimited JSON event streams into progress snapshots and
//! accumulated responses.

pub mod chat;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod pull;
pub mod state;
pub mod stream;

pub use chat::{ChatAggregator, ChatObserver, ConversationHistory};
pub use client::{EventStream, ModelClient};
pub use config::ClientConfig;
pub use endpoint::{resolve, Endpoint};
pub use error::{ClientError, ErrorKind};
pub use models::{
    ChatTranscriptEntry, LayerProgress, ModelSize, ModelSummary, ModifiedAt, PullOutcome,
    PullPhase, PullProgress, StreamEvent, VersionInfo,
};
pub use pull::{classify_status, PullAggregator, PullObserver};
pub use state::AppState;
pub use stream::EventReader;
pub use tokio_util::sync::CancellationToken;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
