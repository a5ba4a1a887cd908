//! The health monitor capability.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a registered monitor.
pub type MonitorRef = Arc<dyn HealthMonitor>;

/// A named, independently pluggable health check.
#[async_trait]
pub trait HealthMonitor: Send + Sync {
    /// Evaluate health.
    ///
    /// With `force_check` the monitor must bypass any cached verdict. An
    /// `Err` is treated as unhealthy by the evaluator.
    async fn is_healthy(&self, force_check: bool) -> anyhow::Result<bool>;

    /// Human readable monitor name
    fn monitor_name(&self) -> &str;

    /// Label value for this monitor's gauge; unique among enabled monitors
    fn metric_name(&self) -> &str;

    /// Whether a persistent failure of this monitor justifies a restart
    fn needs_restart_on_failure(&self) -> bool;

    /// Disabled monitors are dropped at registration
    fn is_enabled(&self) -> bool {
        true
    }
}

impl fmt::Debug for dyn HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("monitor_name", &self.monitor_name())
            .field("metric_name", &self.metric_name())
            .finish()
    }
}
