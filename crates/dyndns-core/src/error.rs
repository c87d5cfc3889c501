//! Error types for the dynamic DNS updater
//!
//! The taxonomy mirrors the failure boundaries of a single-shot run:
//! configuration problems abort before any network call, transport and
//! protocol-shape problems abort the affected lookup, and `NotFound` is a
//! soft condition whose severity depends on the caller (a missing zone is
//! fatal for the site, a missing record triggers a create).

use thiserror::Error;

/// Result type alias for updater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the updater
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing configuration (credentials, unknown method).
    /// Always fatal, raised before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure reaching the provider or an IP-echo service
    /// (connection, DNS, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body was not valid JSON
    #[error("Decode error: {0}")]
    Decode(String),

    /// A decoded response is missing fields the wire contract requires
    /// (e.g. the `page`/`pages` pagination envelope)
    #[error("Protocol shape error: {0}")]
    ProtocolShape(String),

    /// The paginated listing was exhausted without a match
    #[error("Not found: {0}")]
    NotFound(String),

    /// OS-level failure (running a command, reading a file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a protocol-shape error
    pub fn protocol_shape(msg: impl Into<String>) -> Self {
        Self::ProtocolShape(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
