// CLI error types and user-facing notifications

use llamadeck_client::{ClientError, ErrorKind};
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Aborted by user")]
    Aborted,
}

impl CliError {
    /// Notification title for this error
    pub fn title(&self) -> &'static str {
        match self {
            CliError::Client(e) => match e.kind() {
                ErrorKind::EndpointUnreachable => "Connection Error",
                ErrorKind::RemoteOperationFailed => "Server Error",
                ErrorKind::MalformedResponse => "Invalid Response",
                ErrorKind::ModelAlreadyExists => "Model Exists",
                ErrorKind::VerificationFailed => "Verification Failed",
                ErrorKind::IncompleteTransfer => "Incomplete Download",
                ErrorKind::Cancelled => "Cancelled",
                ErrorKind::InvalidInput => "Invalid Input",
            },
            CliError::InvalidArgument { .. } => "Invalid Argument",
            CliError::Io(_) => "IO Error",
            CliError::Aborted => "Aborted",
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::Client(e) => {
                let hint = match e.kind() {
                    ErrorKind::EndpointUnreachable => {
                        "\n\nIs the server running? Check --host/--port or LLAMADECK_HOST."
                    }
                    ErrorKind::ModelAlreadyExists => {
                        "\n\nRun 'deck list' to see installed models."
                    }
                    ErrorKind::IncompleteTransfer => "\n\nRun 'deck pull' again to resume.",
                    _ => "",
                };
                format!("{}: {}{}", self.title(), e, hint)
            }
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {}\n\nRun 'deck --help' for usage information.", message)
            }
            CliError::Io(e) => format!("Terminal IO failed: {}", e),
            CliError::Aborted => "Aborted.".to_string(),
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

pub type CliResult<T> = Result<T, CliError>;
