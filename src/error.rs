//! Error types for kolwatch.

use thiserror::Error;

/// The main error type for kolwatch.
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (sockets, config files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket protocol or transport errors
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Channel communication errors
    #[error("Channel error: {0}")]
    Channel(String),

    /// Invalid input or state
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network connectivity errors
    #[error("Network error: {0}")]
    Network(String),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Create a new invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Check if this error is recoverable (a reconnect may succeed).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::WebSocket(_) | Self::Io(_) | Self::Channel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable() {
        assert!(Error::network("reset by peer").is_recoverable());
        assert!(!Error::config("bad url").is_recoverable());
        assert!(!Error::invalid_input("empty").is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::config("missing [feed] table");
        assert_eq!(err.to_string(), "Configuration error: missing [feed] table");
    }
}
