//! Health service types and configuration.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Metric key reserved for the process-wide verdict.
pub const SERVICE_HEALTH: &str = "SERVICE_HEALTH";

/// Gauge value published for a healthy monitor.
pub const HEALTHY: f64 = 0.0;

/// Gauge value published for an unhealthy monitor.
pub const UNHEALTHY: f64 = 1.0;

pub(crate) const IS_HEALTHY: &str = " is healthy; ";
pub(crate) const IS_UNHEALTHY: &str = " is unhealthy;";

/// Aggregate health verdict for the whole process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateStatus {
    /// True when every evaluated monitor reported healthy
    pub healthy: bool,

    /// One entry per monitor, in evaluation order
    pub description: String,
}

impl AggregateStatus {
    /// Create a healthy status
    pub fn healthy(description: impl Into<String>) -> Self {
        Self {
            healthy: true,
            description: description.into(),
        }
    }

    /// Create an unhealthy status
    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self {
            healthy: false,
            description: description.into(),
        }
    }

    /// Gauge value for this verdict
    pub fn gauge_value(&self) -> f64 {
        if self.healthy { HEALTHY } else { UNHEALTHY }
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.healthy { "healthy" } else { "unhealthy" };
        write!(f, "{}; desc: {}", verdict, self.description)
    }
}

/// Health service configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HealthServiceConfig {
    /// Node identity used as the `node` label on every gauge
    pub node_name: String,

    /// Number of forced retries before a restart is requested
    pub failure_retry_threshold: u32,

    /// Pause between forced retries
    #[serde(with = "humantime_serde")]
    pub failure_retry_interval: Duration,

    /// Delay between the end of one scheduled tick and the start of the next
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,

    /// Grace period for each shutdown phase
    #[serde(with = "humantime_serde")]
    pub shutdown_buffer: Duration,

    /// Delay before the first scheduled tick
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
}

impl Default for HealthServiceConfig {
    fn default() -> Self {
        Self {
            node_name: "localhost".to_string(),
            failure_retry_threshold: 10,
            failure_retry_interval: Duration::from_millis(50),
            retry_interval: Duration::from_millis(100),
            shutdown_buffer: Duration::from_millis(2000),
            initial_delay: Duration::from_millis(300_000),
        }
    }
}
