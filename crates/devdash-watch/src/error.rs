//! Watch error types.

use thiserror::Error;

/// Errors surfaced by subscription setup.
///
/// Transport failures after setup are never returned; they are reported
/// through failure listeners and alerts while the connection retries.
#[derive(Debug, Error)]
pub enum WatchError {
    /// `subscribe` was called before any subscriber was set.
    #[error("no subscriber configured")]
    NoSubscriber,

    /// Server URL cannot be turned into a WebSocket URL.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Token cannot be sent as a header value.
    #[error("invalid auth token")]
    InvalidToken,

    /// WebSocket handshake or framing error.
    #[error("WebSocket error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// REST call failed.
    #[error(transparent)]
    Client(#[from] devdash_client::Error),
}

/// Result type for watch operations.
pub type Result<T> = std::result::Result<T, WatchError>;
