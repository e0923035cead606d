//! Error types for the model deployment cache

use thiserror::Error;

/// Result type alias using the cache Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the model deployment cache
#[derive(Error, Debug)]
pub enum Error {
    // Connection errors
    #[error("Store connection failed: {address} - {message}")]
    Connection { address: String, message: String },

    #[error("Store backend not available: {backend}")]
    StoreUnavailable { backend: String },

    // Store primitive errors
    #[error("Store error: {message}")]
    Store { message: String },

    // Record errors
    #[error("Decode error: {message}")]
    Decode { message: String },

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Build a decode error from anything displayable
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode {
            message: message.into(),
        }
    }

    /// Returns true if this error is retryable by the caller
    ///
    /// The cache itself never retries; the routing layer decides.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connection { .. } | Error::Store { .. })
    }

    /// Returns true if this error indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Decode { .. } | Error::InvalidConfig { .. })
    }

    /// Returns a retry delay hint in milliseconds, if applicable
    pub fn retry_delay_hint_ms(&self) -> Option<u64> {
        match self {
            Error::Connection { .. } => Some(2000),
            Error::Store { .. } => Some(100),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode {
            message: e.to_string(),
        }
    }
}
