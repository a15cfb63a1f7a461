//! Error types shared by the relay core.

use std::time::Duration;

use thiserror::Error;

/// Errors that can end a call session.
///
/// None of these escape the call that produced them; the session driver
/// records them and tears the call down.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Connecting to the realtime session failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A read or write on an established socket failed
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// A frame could not be decoded into a known event shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// An outgoing event could not be serialized
    #[error("Encode error: {0}")]
    Encode(String),

    /// No frame arrived within the configured idle window
    #[error("No frame received within {0:?}")]
    Timeout(Duration),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A relay task panicked or was cancelled by the runtime
    #[error("Relay task failed: {0}")]
    Task(String),
}

/// Result type for relay operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
