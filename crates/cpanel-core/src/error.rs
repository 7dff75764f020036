//! Error types for the cPanel connector
//!
//! Every adapter failure is surfaced unchanged through the reconcilers to the
//! caller. No variant ever carries the API token.

use thiserror::Error;

/// Result type alias for cPanel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the cPanel connector
#[derive(Error, Debug)]
pub enum Error {
    /// The backend could not be reached (network, DNS, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body was not JSON, or lacked the dialect's envelope
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The backend parsed the request but reported failure
    #[error("cPanel API rejected {call}: {reason}")]
    ApiRejected {
        /// The `Module::function` that was called
        call: String,
        /// Reason reported by the backend, or the dialect's fallback message
        reason: String,
    },

    /// A zone record was written but its line could not be determined
    #[error("Record created in zone {zone} but its line could not be determined: {detail}")]
    IdentifierResolution {
        /// Zone the record was added to
        zone: String,
        /// What went wrong during the confirmation read
        detail: String,
    },

    /// Tracked state or a named entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// State store-related errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an API rejection
    pub fn rejected(call: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ApiRejected {
            call: call.into(),
            reason: reason.into(),
        }
    }

    /// Create an identifier resolution failure
    pub fn identifier_resolution(zone: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::IdentifierResolution {
            zone: zone.into(),
            detail: detail.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Whether the backend itself refused the request
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ApiRejected { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
