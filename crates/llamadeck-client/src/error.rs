//! Error types for model server operations

use thiserror::Error;

/// Coarse classification of a [`ClientError`], used by front ends to pick a
/// notification without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EndpointUnreachable,
    RemoteOperationFailed,
    MalformedResponse,
    ModelAlreadyExists,
    VerificationFailed,
    IncompleteTransfer,
    Cancelled,
    InvalidInput,
}

/// Errors that can occur while talking to the model server
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Server unreachable: {0}")]
    EndpointUnreachable(String),

    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Model already exists: {0}")]
    ModelAlreadyExists(String),

    #[error("Model verification failed: {0}")]
    VerificationFailed(String),

    #[error("Incomplete transfer ({}kB/{}kB)", .downloaded / 1024, .total / 1024)]
    IncompleteTransfer { downloaded: u64, total: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid model name: {0}")]
    InvalidModelName(String),

    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ClientError {
    /// The kind tag for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::EndpointUnreachable(_) => ErrorKind::EndpointUnreachable,
            ClientError::RemoteOperationFailed(_) => ErrorKind::RemoteOperationFailed,
            ClientError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            ClientError::ModelAlreadyExists(_) => ErrorKind::ModelAlreadyExists,
            ClientError::VerificationFailed(_) => ErrorKind::VerificationFailed,
            ClientError::IncompleteTransfer { .. } => ErrorKind::IncompleteTransfer,
            ClientError::Cancelled => ErrorKind::Cancelled,
            ClientError::InvalidModelName(_)
            | ClientError::EmptyPrompt
            | ClientError::ConfigError(_) => ErrorKind::InvalidInput,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            // connect, timeout, request and mid-body failures all mean the
            // server could not be reached or went away
            ClientError::EndpointUnreachable(err.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::EndpointUnreachable(err.to_string())
    }
}
