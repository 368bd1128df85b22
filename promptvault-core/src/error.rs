//! # Errors
//!
//! Every fallible operation in this crate returns [`VaultError`]. The store keeps a
//! cloneable [`ErrorDescriptor`] in its state so that subscribers can render the last
//! search failure without holding on to the original error.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Connection refused, DNS failure, reset by peer...
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request did not complete within the configured budget
    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Non-2xx response carrying the service's detail message
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Payload rejected, either locally before dispatch or by the service
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Prompt not found: {id}")]
    NotFound { id: String },

    /// Response body could not be decoded
    #[error("Failed to decode {context}: {message}")]
    Decode { context: String, message: String },
}

pub type Result<T> = std::result::Result<T, VaultError>;

impl VaultError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Timeouts and transport failures are the same thing to a caller deciding
    /// whether to try again. Nothing in this crate retries on its own.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Server { .. } => ErrorKind::Server,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Server,
    Validation,
    NotFound,
    Decode,
}

/// What the store remembers about the last failed search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&VaultError> for ErrorDescriptor {
    fn from(err: &VaultError) -> Self {
        let message = match err {
            VaultError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            kind: err.kind(),
            message,
        }
    }
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
