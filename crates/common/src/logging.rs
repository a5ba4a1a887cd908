//! Logging utilities for the health service components.

use crate::error::{Error, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize tracing with a default level and output format.
///
/// RUST_LOG still wins when it is set. Fails if a global subscriber is
/// already installed.
pub fn init_with_level(default_level: &str, json: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    let outcome = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    outcome.map_err(Error::logging)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_logging_error() {
        // A subscriber is installed after the first call either way
        let _ = init_with_level("info", false);
        assert!(matches!(init_with_level("debug", true), Err(Error::Logging(_))));
    }
}
