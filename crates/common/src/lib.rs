//! Common utilities and types shared across the health service crates.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
