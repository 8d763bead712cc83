//! Application state owned by the front end
//!
//! Holds what the desktop client kept in widgets: the server address as the
//! user typed it, the model list and selection, and the conversation. A
//! fresh [`ModelClient`] is resolved from the current address for every
//! operation so edits take effect immediately.

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::{
    chat::{ChatObserver, ConversationHistory},
    client::ModelClient,
    config::ClientConfig,
    models::ChatTranscriptEntry,
    Result,
};

/// Model offered when the server cannot be listed
pub const FALLBACK_MODEL: &str = "llama2";

#[derive(Debug, Clone)]
pub struct AppState {
    config: ClientConfig,
    available_models: Vec<String>,
    selected_model: Option<String>,
    history: ConversationHistory,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            available_models: Vec::new(),
            selected_model: None,
            history: ConversationHistory::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the raw server address
    pub fn set_server(&mut self, host: impl Into<String>, port: impl Into<String>) {
        self.config.host = host.into();
        self.config.port = port.into();
    }

    /// Client for the current server address
    pub fn client(&self) -> Result<ModelClient> {
        ModelClient::from_config(&self.config)
    }

    /// Selected model, falling back to the configured default
    pub fn selected_model(&self) -> &str {
        self.selected_model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(self.config.default_model.as_str())
    }

    pub fn select_model(&mut self, name: impl Into<String>) {
        self.selected_model = Some(name.into());
    }

    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    /// Reload the model names and select the first one.
    ///
    /// On failure the list falls back to [`FALLBACK_MODEL`] so the chat stays
    /// usable, and the error is returned for the caller to report.
    pub async fn refresh_models(&mut self) -> Result<&[String]> {
        let listing = match self.client() {
            Ok(client) => client.list_models().await,
            Err(e) => Err(e),
        };

        match listing {
            Ok(models) => {
                self.available_models = models.into_iter().map(|m| m.name).collect();
                self.selected_model = self.available_models.first().cloned();
                Ok(self.available_models.as_slice())
            }
            Err(e) => {
                warn!("Model refresh failed, falling back to {}: {}", FALLBACK_MODEL, e);
                self.available_models = vec![FALLBACK_MODEL.to_string()];
                self.selected_model = Some(FALLBACK_MODEL.to_string());
                Err(e)
            }
        }
    }

    /// Send `prompt` to the selected model and record the exchange
    pub async fn send_message<O>(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<ChatTranscriptEntry>
    where
        O: ChatObserver + ?Sized,
    {
        let client = self.client()?;
        let model = self.selected_model().to_string();
        client
            .generate(&model, prompt, &mut self.history, cancel, observer)
            .await
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}
