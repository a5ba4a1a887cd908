//! Common error types for the health service components.

use std::fmt;

/// A specialized Result type for health service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type shared by the daemon and its helpers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Health service error: {0}")]
    Health(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl Error {
    /// Create a new health service error.
    pub fn health(msg: impl fmt::Display) -> Self {
        Error::Health(msg.to_string())
    }

    /// Create a new configuration error.
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new logging error.
    pub fn logging(msg: impl fmt::Display) -> Self {
        Error::Logging(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::health("duplicate metric").to_string(),
            "Health service error: duplicate metric"
        );
        assert_eq!(Error::config("bad yaml").to_string(), "Configuration error: bad yaml");
        assert_eq!(
            Error::logging("already set").to_string(),
            "Logging error: already set"
        );
    }
}
