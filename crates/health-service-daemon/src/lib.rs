//! Health service daemon
//!
//! Loads monitor definitions from YAML, runs the health service with a
//! TCP monitor per configured endpoint, and exits when the service asks
//! for a restart so that a process supervisor can bring it back.

pub mod config;
pub mod daemon;

pub use config::{Config, ConfigError};
pub use daemon::{Daemon, ExitReason, RunOutcome};
