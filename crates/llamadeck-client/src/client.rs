//! Model server client
//!
//! Request/response calls (list, delete, verify, version) and the two
//! streaming operations (pull, generate) against the server's `/api/*`
//! endpoints. Request/response calls are bounded by the configured timeout;
//! streaming calls only by the connect timeout, since a pull can run for hours.
//! Nothing is retried: each failure is returned to the caller once.

use std::{sync::Arc, time::Duration};

use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    chat::{ChatAggregator, ChatObserver, ConversationHistory},
    config::ClientConfig,
    endpoint::Endpoint,
    error::ClientError,
    models::{ChatTranscriptEntry, ModelSummary, PullOutcome, StreamEvent, VersionInfo},
    pull::{PullAggregator, PullObserver},
    stream::EventReader,
    Result,
};

/// Default timeout for request/response calls (30 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout (5 seconds)
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default pool idle timeout (90 seconds)
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Default TCP keep-alive interval (60 seconds)
const DEFAULT_TCP_KEEPALIVE_SECS: u64 = 60;

/// Event reader over a streaming response body
pub type EventStream = EventReader<BoxStream<'static, reqwest::Result<Vec<u8>>>, StreamEvent>;

/// Client for one model server endpoint
pub struct ModelClient {
    client: Arc<Client>,
    endpoint: Endpoint,
    timeout: Duration,
}

impl ModelClient {
    /// Create a client with default timeouts
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        Self::with_timeouts(
            endpoint,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Create a client with custom timeouts
    ///
    /// # Arguments
    /// * `endpoint` - Resolved server endpoint
    /// * `timeout` - Bound for request/response calls
    /// * `connect_timeout` - Bound for establishing any connection
    pub fn with_timeouts(
        endpoint: Endpoint,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        if endpoint.host.is_empty() {
            return Err(ClientError::ConfigError(
                "Server host is required".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(DEFAULT_TCP_KEEPALIVE_SECS))
            .build()
            .map_err(|e| ClientError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            endpoint,
            timeout,
        })
    }

    /// Create a client from raw host and port input
    pub fn from_input(host: &str, port: &str) -> Result<Self> {
        Self::new(Endpoint::resolve(host, port))
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::with_timeouts(config.endpoint(), config.timeout(), config.connect_timeout())
    }

    /// Create a client for the default local endpoint
    pub fn with_default_endpoint() -> Result<Self> {
        Self::from_input("localhost", "11434")
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn base_url(&self) -> String {
        self.endpoint.base_url()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// List installed models, sorted by name ignoring case
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>> {
        debug!("Listing models at {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.url("/api/tags"))
            .timeout(self.timeout)
            .send()
            .await?;

        let response = ensure_success(response, "list models").await?;
        let body = read_json(response).await?;

        let entries = match body.get("models") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries.clone(),
            Some(other) => {
                return Err(ClientError::MalformedResponse(format!(
                    "expected a models array, got {}",
                    other
                )))
            }
        };

        let mut models: Vec<ModelSummary> = entries
            .iter()
            .filter_map(|entry| {
                let summary = ModelSummary::from_value(entry);
                if summary.is_none() {
                    warn!("Skipping model entry without a name: {}", entry);
                }
                summary
            })
            .collect();
        models.sort_by_cached_key(|m| m.name.to_lowercase());

        debug!("Listed {} models", models.len());
        Ok(models)
    }

    /// Delete a model. Any failure, including a network failure, is
    /// reported as `RemoteOperationFailed`.
    pub async fn delete_model(&self, name: &str) -> Result<()> {
        validate_model_name(name)?;
        debug!("Deleting model: {}", name);

        let response = self
            .client
            .delete(self.endpoint.url("/api/delete"))
            .timeout(self.timeout)
            .json(&json!({ "name": name }))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete model {}: {}", name, e);
                ClientError::RemoteOperationFailed(e.to_string())
            })?;

        ensure_success(response, "delete model").await?;
        info!("Deleted model: {}", name);
        Ok(())
    }

    /// Server version
    pub async fn get_version(&self) -> Result<VersionInfo> {
        debug!("Fetching server version from {}", self.endpoint);

        let response = self
            .client
            .get(self.endpoint.url("/api/version"))
            .timeout(self.timeout)
            .send()
            .await?;

        let response = ensure_success(response, "get version").await?;
        let body = read_json(response).await?;
        Ok(VersionInfo::from_value(body))
    }

    /// Check the server can describe `name`
    pub async fn verify(&self, name: &str) -> Result<()> {
        validate_model_name(name)?;
        debug!("Verifying model: {}", name);

        let response = self
            .client
            .post(self.endpoint.url("/api/show"))
            .timeout(self.timeout)
            .json(&json!({ "name": name }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Verification of {} failed: HTTP {}: {}", name, status, error_text);
            return Err(ClientError::VerificationFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }
        Ok(())
    }

    /// Start a pull and return its event stream.
    ///
    /// Fails with `ModelAlreadyExists` without contacting the pull endpoint
    /// when the listing already holds exactly `name`.
    pub async fn pull_start(&self, name: &str, cancel: &CancellationToken) -> Result<EventStream> {
        validate_model_name(name)?;

        let installed = self.list_models().await?;
        if installed.iter().any(|m| m.name == name) {
            warn!("Model {} is already installed", name);
            return Err(ClientError::ModelAlreadyExists(name.to_string()));
        }

        debug!("Pulling model: {}", name);
        let response = self
            .client
            .post(self.endpoint.url("/api/pull"))
            .json(&json!({ "name": name, "insecure": true }))
            .send()
            .await?;

        let response = ensure_success(response, "pull model").await?;
        Ok(event_stream(response, cancel))
    }

    /// Run a pull to completion.
    ///
    /// `observer` sees every progress change. After the stream closes the
    /// model is verified, then the byte counts are checked.
    pub async fn pull_model<O>(
        &self,
        name: &str,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<PullOutcome>
    where
        O: PullObserver + ?Sized,
    {
        let mut events = self.pull_start(name, cancel).await?;
        let mut aggregator = PullAggregator::new();

        while let Some(event) = events.next_event().await? {
            if let Some(progress) = aggregator.apply(&event)? {
                observer.on_progress(&progress);
            }
        }
        if events.skipped() > 0 {
            warn!("Skipped {} malformed lines while pulling {}", events.skipped(), name);
        }

        self.verify(name).await?;
        aggregator.check_complete()?;

        info!(
            "Pulled model {} ({} bytes in {} layers)",
            name,
            aggregator.downloaded_bytes(),
            aggregator.layers().len()
        );
        Ok(PullOutcome {
            model: name.to_string(),
            downloaded_bytes: aggregator.downloaded_bytes(),
            total_bytes: aggregator.total_bytes(),
            layers: aggregator.layers().len(),
        })
    }

    /// Stream a completion for `prompt`.
    ///
    /// Fragments reach `observer` as they arrive. When the stream closes the
    /// exchange is appended to `history` and handed to the observer.
    pub async fn generate<O>(
        &self,
        model: &str,
        prompt: &str,
        history: &mut ConversationHistory,
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> Result<ChatTranscriptEntry>
    where
        O: ChatObserver + ?Sized,
    {
        validate_model_name(model)?;
        if prompt.trim().is_empty() {
            return Err(ClientError::EmptyPrompt);
        }

        debug!("Generating with model {} (prompt_len={})", model, prompt.len());
        let response = self
            .client
            .post(self.endpoint.url("/api/generate"))
            .json(&json!({ "model": model, "prompt": prompt, "stream": true }))
            .send()
            .await?;

        let response = ensure_success(response, "generate").await?;
        let mut events = event_stream(response, cancel);
        let mut aggregator = ChatAggregator::new();

        while let Some(event) = events.next_event().await? {
            if let Some(fragment) = aggregator.apply(&event)? {
                observer.on_fragment(fragment);
            }
        }
        if !aggregator.is_done() {
            debug!("Generate stream closed without a done marker");
        }

        let entry = aggregator.finish(prompt);
        history.push(entry.clone());
        observer.on_complete(&entry);
        Ok(entry)
    }
}

fn validate_model_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ClientError::InvalidModelName(
            "Model name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Pass 2xx responses through; anything else becomes `RemoteOperationFailed`
async fn ensure_success(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    error!("Failed to {}: HTTP {}: {}", operation, status, error_text);
    Err(ClientError::RemoteOperationFailed(format!(
        "HTTP {}: {}",
        status, error_text
    )))
}

async fn read_json(response: Response) -> Result<Value> {
    let text = response.text().await?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        error!("Failed to parse response body: {}", e);
        ClientError::MalformedResponse(e.to_string())
    })?;
    if !value.is_object() {
        return Err(ClientError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            value
        )));
    }
    Ok(value)
}

fn event_stream(response: Response, cancel: &CancellationToken) -> EventStream {
    let chunks = response
        .bytes_stream()
        .map_ok(|chunk| chunk.to_vec())
        .boxed();
    EventReader::with_cancellation(chunks, cancel.clone())
}
