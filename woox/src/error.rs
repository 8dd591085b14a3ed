use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WooxError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// The API answered with `success: false`.
    #[error("API error: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid order data in row {row}: {field} = {value:?}")]
    InvalidOrder {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("invalid order row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, WooxError>;

/// Failure class of a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Network or connection failure.
    Transport,
    /// Non-success response flag, unexpected status or missing fields.
    Protocol,
    /// Malformed numeric fields inside an order row.
    Data,
    /// Local misconfiguration (bad window, bad base URL).
    Config,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Data => "data",
            ErrorKind::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WooxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WooxError::Request(e) if e.is_decode() => ErrorKind::Protocol,
            WooxError::Request(_) => ErrorKind::Transport,
            WooxError::Http { .. }
            | WooxError::Api(_)
            | WooxError::MalformedResponse(_)
            | WooxError::Json(_) => ErrorKind::Protocol,
            WooxError::InvalidOrder { .. } | WooxError::InvalidRow { .. } => ErrorKind::Data,
            WooxError::Url(_) | WooxError::Validation(_) => ErrorKind::Config,
        }
    }
}

/// Cloneable error summary handed to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&WooxError> for ErrorInfo {
    fn from(e: &WooxError) -> Self {
        let message = match e {
            // Server-sourced text is shown as-is.
            WooxError::Api(msg) => msg.clone(),
            other => other.to_string(),
        };
        Self {
            kind: e.kind(),
            message,
        }
    }
}

impl From<WooxError> for ErrorInfo {
    fn from(e: WooxError) -> Self {
        ErrorInfo::from(&e)
    }
}
