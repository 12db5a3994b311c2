//! # Error Types
//!
//! Typed error handling for the estore checkout core.
//! Every fallible operation returns `Result<T, ShopError>`; the orchestration
//! components convert these into a user-visible [`Alert`](crate::Alert)
//! at their boundary instead of propagating them further.

use thiserror::Error;

/// Core error type for session and checkout operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// A required field is missing or invalid
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Not authenticated, or authorization rejected upstream
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Persistent store read/write failure, or an unreadable pending payload
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Transport failure talking to a backend
    #[error("Network error: {0}")]
    Network(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Backend reported a failure, optionally with a human readable message
    #[error("Request rejected (HTTP {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// Session timed out
    #[error("Session expired")]
    Expired,

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ShopError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShopError::Network(_) | ShopError::ProviderError { .. }
        )
    }

    /// Returns true for authentication and authorization failures
    pub fn is_auth(&self) -> bool {
        matches!(self, ShopError::Auth(_) | ShopError::Expired)
    }

    /// Message reported by the backend, if any
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            ShopError::Rejected { message, .. } => message.as_deref(),
            ShopError::ProviderError { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Validation(_) => 400,
            ShopError::Auth(_) => 401,
            ShopError::Expired => 401,
            ShopError::Persistence(_) => 500,
            ShopError::Network(_) => 503,
            ShopError::ProviderError { .. } => 502,
            ShopError::Rejected { status, .. } => *status,
            ShopError::Configuration(_) => 500,
            ShopError::Serialization(_) => 500,
        }
    }
}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        ShopError::Serialization(err.to_string())
    }
}

/// Result type alias for shop operations
pub type ShopResult<T> = Result<T, ShopError>;
