//! Shared error types for SQLBridge.
//!
//! Every crate in the workspace reports failures through [`BridgeError`] so callers
//! can branch on the failure kind (reconfigure, refresh a token, retry) without
//! string matching.
//!
//! ## Example Usage
//!
//! ```rust
//! use sqlbridge_commons::errors::{BridgeError, Result};
//!
//! fn require_engine(name: &str) -> Result<()> {
//!     if name.is_empty() {
//!         return Err(BridgeError::ConfigurationError("engine name cannot be empty".into()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type for SQLBridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised by the dialect engine and the execution protocol.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// Bad or missing parameters, detected before any I/O.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A connection could not be established or validated.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A submitted operation failed remotely or while decoding its result.
    #[error("{}", format_execution_error(.status.as_deref(), .message))]
    ExecutionError {
        /// Remote status (HTTP status code, statement state, ...) when known.
        status: Option<String>,
        message: String,
    },

    /// The dialect does not support the capability a function requires.
    #[error("Unsupported capability '{capability}' required by {function}")]
    UnsupportedCapability {
        capability: String,
        function: String,
    },

    /// Credentials were rejected.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The bearer token is no longer valid; callers should refresh it.
    #[error("Token expired: {0}")]
    TokenExpired(String),

    /// Local I/O failure (sink writes, overlay files).
    #[error("I/O error: {0}")]
    Io(String),

    /// Encoding or decoding failure of a result payload.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn format_execution_error(status: Option<&str>, message: &str) -> String {
    match status {
        Some(status) => format!("Execution error ({}): {}", status, message),
        None => format!("Execution error: {}", message),
    }
}

impl BridgeError {
    /// Execution failure without a remote status.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::ExecutionError {
            status: None,
            message: message.into(),
        }
    }

    /// Execution failure carrying the remote status.
    pub fn execution_with_status(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionError {
            status: Some(status.into()),
            message: message.into(),
        }
    }

    pub fn unsupported(capability: impl Into<String>, function: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            capability: capability.into(),
            function: function.into(),
        }
    }

    /// Whether a bounded retry may succeed where this attempt failed.
    ///
    /// Configuration, capability and credential failures are deterministic and
    /// never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_)
            | Self::ExecutionError { .. }
            | Self::Io(_)
            | Self::Serialization(_) => true,
            Self::ConfigurationError(_)
            | Self::UnsupportedCapability { .. }
            | Self::AuthenticationError(_)
            | Self::TokenExpired(_) => false,
        }
    }

    /// Whether the failure means the transport is unreachable or unauthenticated.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_) | Self::AuthenticationError(_) | Self::TokenExpired(_)
        )
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for BridgeError {
    fn from(err: csv::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::ConfigurationError(format!("TOML parse error: {}", err))
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            return BridgeError::ConnectionError(err.to_string());
        }
        match err.status() {
            Some(status) => BridgeError::execution_with_status(status.as_u16().to_string(), err.to_string()),
            None => BridgeError::execution(err.to_string()),
        }
    }
}
